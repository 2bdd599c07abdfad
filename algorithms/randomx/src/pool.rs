//! Bounded free-list of VMs.
//!
//! A VM is taken for the duration of one hash and handed back afterwards.
//! When the list is empty a new VM is allocated; when it is full, or the pool
//! has been closed, the returned VM is dropped (and wiped).

use parking_lot::Mutex;

use crate::types::AesKernels;
use crate::vm::Vm;

struct Idle {
    vms: Vec<Box<Vm>>,
    closed: bool,
}

pub(crate) struct VmPool {
    idle: Mutex<Idle>,
    capacity: usize,
    kernels: AesKernels,
}

impl VmPool {
    pub(crate) fn new(capacity: usize, kernels: AesKernels) -> Self {
        Self {
            idle: Mutex::new(Idle {
                vms: Vec::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            kernels,
        }
    }

    /// Run `f` with exclusive use of a VM.
    pub(crate) fn with_vm<R>(&self, f: impl FnOnce(&mut Vm) -> R) -> R {
        let pooled = self.idle.lock().vms.pop();
        let mut vm = pooled.unwrap_or_else(|| {
            tracing::debug!(capacity = self.capacity, "allocating vm");
            Box::new(Vm::with_kernels(self.kernels))
        });
        let out = f(&mut vm);
        self.release(vm);
        out
    }

    fn release(&self, vm: Box<Vm>) {
        let mut idle = self.idle.lock();
        if !idle.closed && idle.vms.len() < self.capacity {
            idle.vms.push(vm);
        }
    }

    pub(crate) fn idle(&self) -> usize {
        self.idle.lock().vms.len()
    }

    /// Drop every idle VM and refuse VMs handed back later.
    pub(crate) fn close(&self) {
        let mut idle = self.idle.lock();
        idle.closed = true;
        idle.vms.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dispatcher::portable_kernels;

    #[test]
    fn test_vm_reused_up_to_capacity() {
        let pool = VmPool::new(1, portable_kernels());
        assert_eq!(pool.idle(), 0);

        pool.with_vm(|_| ());
        assert_eq!(pool.idle(), 1);

        // Nested use needs a second VM; only one fits back in the pool.
        pool.with_vm(|_| pool.with_vm(|_| ()));
        assert_eq!(pool.idle(), 1);

        pool.close();
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_vm_in_use_during_close_is_not_retained() {
        let pool = VmPool::new(4, portable_kernels());
        pool.with_vm(|_| pool.close());
        assert_eq!(pool.idle(), 0);

        // Later checkouts still work but never refill the pool.
        pool.with_vm(|_| ());
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_zero_capacity_never_retains() {
        let pool = VmPool::new(0, portable_kernels());
        let value = pool.with_vm(|_| 7);
        assert_eq!(value, 7);
        assert_eq!(pool.idle(), 0);
    }
}
