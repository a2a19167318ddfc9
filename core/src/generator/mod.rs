use crate::*;
pub use random::*;

mod random;

pub trait LayoutGenerator {
    fn generate(self, config: GameConfig) -> MineLayout;
}

/// What the generator guarantees about the cell the host opens first.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartCell {
    Random,
    #[default]
    SimpleSafe,
    AlwaysZero,
}
