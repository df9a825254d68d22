pub mod block_grid;
pub mod codec;
pub mod pixel;
pub mod resample;
pub mod tone;
