//! Simulated out-of-order x86 core used to schedule superscalar programs.
//!
//! Three execution ports (P0, P1, P5), a cycle map per port, and the six
//! legal 16-byte decode group layouts.

use crate::kernels::constants::SUPERSCALAR_LATENCY;

/// Cycles tracked in the port occupancy map.
pub const CYCLE_MAP_SIZE: usize = SUPERSCALAR_LATENCY + 4;

/// How many cycles operand selection may look ahead before giving up.
pub const LOOK_FORWARD_CYCLES: usize = 4;

/// Consecutive discarded instructions tolerated before a decode group is abandoned.
pub const MAX_THROWAWAY_COUNT: usize = 256;

// =============================================================================
// EXECUTION PORTS
// =============================================================================

/// Bit set of execution ports a micro-op may issue to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ports(u8);

impl Ports {
    pub const NONE: Self = Self(0);
    pub const P0: Self = Self(1);
    pub const P1: Self = Self(2);
    pub const P5: Self = Self(4);
    pub const P01: Self = Self(1 | 2);
    pub const P05: Self = Self(1 | 4);
    pub const P015: Self = Self(1 | 2 | 4);

    const fn contains(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    const fn is_none(self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// MACRO-OPS
// =============================================================================

/// x86 macro-op: encoded size, latency and at most two micro-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroOp {
    pub size: u8,
    pub latency: u8,
    uop1: Ports,
    uop2: Ports,
    /// Must wait for the result of the previous macro-op of the same instruction.
    dependent: bool,
}

impl MacroOp {
    const fn new(size: u8, latency: u8, uop1: Ports, uop2: Ports) -> Self {
        Self {
            size,
            latency,
            uop1,
            uop2,
            dependent: false,
        }
    }

    const fn dependent(self) -> Self {
        Self {
            dependent: true,
            ..self
        }
    }

    /// Eliminated by register renaming; occupies no port.
    const fn is_eliminated(&self) -> bool {
        self.uop1.is_none()
    }

    const fn is_simple(&self) -> bool {
        self.uop2.is_none()
    }

    pub const ADD_RI: Self = Self::new(7, 1, Ports::P015, Ports::NONE);
    pub const LEA_SIB: Self = Self::new(4, 1, Ports::P01, Ports::NONE);
    pub const SUB_RR: Self = Self::new(3, 1, Ports::P015, Ports::NONE);
    pub const XOR_RR: Self = Self::new(3, 1, Ports::P015, Ports::NONE);
    pub const XOR_RI: Self = Self::new(7, 1, Ports::P015, Ports::NONE);
    pub const MUL_R: Self = Self::new(3, 4, Ports::P1, Ports::P5);
    pub const IMUL_R: Self = Self::new(3, 4, Ports::P1, Ports::P5);
    pub const IMUL_RR: Self = Self::new(4, 3, Ports::P1, Ports::NONE);
    pub const IMUL_RR_DEPENDENT: Self = Self::IMUL_RR.dependent();
    pub const ROR_RI: Self = Self::new(4, 1, Ports::P05, Ports::NONE);
    pub const MOV_RR: Self = Self::new(3, 0, Ports::NONE, Ports::NONE);
    pub const MOV_RI64: Self = Self::new(10, 1, Ports::P015, Ports::NONE);
}

// =============================================================================
// PORT SCHEDULER
// =============================================================================

/// Per-cycle occupancy of ports P0, P1 and P5.
#[derive(Clone)]
pub struct PortMap {
    busy: [[bool; 3]; CYCLE_MAP_SIZE],
}

impl PortMap {
    pub const fn new() -> Self {
        Self {
            busy: [[false; 3]; CYCLE_MAP_SIZE],
        }
    }

    /// Earliest cycle `>= cycle` with a free port for `uop`.
    ///
    /// Ports are tried in order P5, P0, P1 so generic micro-ops stay off the
    /// multiplication port when possible.
    fn schedule_uop(&mut self, uop: Ports, start: usize, commit: bool) -> Option<usize> {
        const ORDER: [(Ports, usize); 3] = [(Ports::P5, 2), (Ports::P0, 0), (Ports::P1, 1)];
        for cycle in start..CYCLE_MAP_SIZE {
            for (port, slot) in ORDER {
                if uop.contains(port) && !self.busy[cycle][slot] {
                    if commit {
                        self.busy[cycle][slot] = true;
                    }
                    return Some(cycle);
                }
            }
        }
        None
    }

    /// Earliest cycle at which every micro-op of `mop` can issue.
    ///
    /// Two-uop macro-ops are scheduled conservatively: both micro-ops must
    /// issue in the same cycle. Returns `None` when the cycle map is exhausted.
    pub fn schedule_mop(
        &mut self,
        mop: &MacroOp,
        cycle: usize,
        dep_cycle: usize,
        commit: bool,
    ) -> Option<usize> {
        let cycle = if mop.dependent {
            cycle.max(dep_cycle)
        } else {
            cycle
        };

        if mop.is_eliminated() {
            return Some(cycle);
        }
        if mop.is_simple() {
            return self.schedule_uop(mop.uop1, cycle, commit);
        }

        for c in cycle..CYCLE_MAP_SIZE {
            let c1 = self.schedule_uop(mop.uop1, c, false);
            let c2 = self.schedule_uop(mop.uop2, c, false);
            if let (Some(c1), Some(c2)) = (c1, c2) {
                if c1 == c2 {
                    if commit {
                        self.schedule_uop(mop.uop1, c1, true);
                        self.schedule_uop(mop.uop2, c2, true);
                    }
                    return Some(c1);
                }
            }
        }
        None
    }
}

// =============================================================================
// DECODER
// =============================================================================

/// One 16-byte decode group layout (slot sizes in bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderBuffer {
    pub index: usize,
    pub slots: &'static [usize],
}

impl DecoderBuffer {
    pub const B484: Self = Self { index: 0, slots: &[4, 8, 4] };
    pub const B7333: Self = Self { index: 1, slots: &[7, 3, 3, 3] };
    pub const B3733: Self = Self { index: 2, slots: &[3, 7, 3, 3] };
    pub const B493: Self = Self { index: 3, slots: &[4, 9, 3] };
    pub const B4444: Self = Self { index: 4, slots: &[4, 4, 4, 4] };
    pub const B3310: Self = Self { index: 5, slots: &[3, 3, 10] };

    /// Layouts picked at random when no constraint applies.
    pub const RANDOM: [Self; 4] = [Self::B484, Self::B7333, Self::B3733, Self::B493];

    pub const fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_buffers_fill_16_bytes() {
        for b in [
            DecoderBuffer::B484,
            DecoderBuffer::B7333,
            DecoderBuffer::B3733,
            DecoderBuffer::B493,
            DecoderBuffer::B4444,
            DecoderBuffer::B3310,
        ] {
            assert_eq!(b.slots.iter().sum::<usize>(), 16, "buffer {}", b.index);
        }
    }

    #[test]
    fn test_generic_uops_prefer_p5_then_p0_then_p1() {
        let mut map = PortMap::new();
        assert_eq!(map.schedule_uop(Ports::P015, 0, true), Some(0));
        assert!(map.busy[0][2]);
        assert_eq!(map.schedule_uop(Ports::P015, 0, true), Some(0));
        assert!(map.busy[0][0]);
        assert_eq!(map.schedule_uop(Ports::P015, 0, true), Some(0));
        assert!(map.busy[0][1]);
        assert_eq!(map.schedule_uop(Ports::P015, 0, true), Some(1));
    }

    #[test]
    fn test_two_uop_ops_share_a_cycle() {
        let mut map = PortMap::new();
        // Occupy P5 in cycle 0: MUL (P1 + P5) must move to cycle 1.
        map.schedule_uop(Ports::P5, 0, true);
        assert_eq!(map.schedule_mop(&MacroOp::MUL_R, 0, 0, true), Some(1));
        assert!(map.busy[1][1] && map.busy[1][2]);
    }

    #[test]
    fn test_eliminated_and_dependent_ops() {
        let mut map = PortMap::new();
        assert_eq!(map.schedule_mop(&MacroOp::MOV_RR, 7, 0, true), Some(7));
        assert_eq!(map.schedule_mop(&MacroOp::IMUL_RR_DEPENDENT, 2, 9, false), Some(9));
        assert_eq!(map.schedule_mop(&MacroOp::IMUL_RR, 2, 9, false), Some(2));
    }

    #[test]
    fn test_exhausted_map_returns_none() {
        let mut map = PortMap::new();
        assert_eq!(map.schedule_uop(Ports::P1, CYCLE_MAP_SIZE, false), None);
    }
}
