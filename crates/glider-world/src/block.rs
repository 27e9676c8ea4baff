/// Block state key in the engine's own numbering. The wire id for a given version comes from
/// the block mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockState(pub u32);

impl BlockState {
    pub const AIR: BlockState = BlockState(0);

    pub fn from_global_id(id: u32) -> Self {
        BlockState(id)
    }

    pub fn get_global_id(&self) -> u32 {
        self.0
    }

    pub fn is_air(&self) -> bool {
        self.0 == 0
    }
}

/// Per-block predicates supplied by the world collaborator.
pub trait BlockProperties: Send + Sync {
    fn is_air(&self, state: BlockState) -> bool;

    /// Blocks motion or holds fluid. Drives the `MOTION_BLOCKING` heightmap.
    fn is_motion_blocking(&self, state: BlockState) -> bool;
}

/// State 0 is air and everything else blocks motion.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleProperties;

impl BlockProperties for SimpleProperties {
    fn is_air(&self, state: BlockState) -> bool {
        state.is_air()
    }

    fn is_motion_blocking(&self, state: BlockState) -> bool {
        !state.is_air()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_properties() {
        let props = SimpleProperties;
        assert!(props.is_air(BlockState::AIR));
        assert!(!props.is_motion_blocking(BlockState::AIR));
        assert!(props.is_motion_blocking(BlockState(1)));
    }
}
