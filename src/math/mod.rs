pub mod init;
pub mod matrix;
pub mod random;

pub use init::Initializer;
pub use matrix::Matrix;
pub use random::RandomSource;
