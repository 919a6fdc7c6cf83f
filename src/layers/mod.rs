pub mod dense;
pub mod dropout;
pub mod layer;
pub mod recurrent;

pub use dense::DenseLayer;
pub use dropout::Dropout;
pub use layer::{Layer, LayerGradients, Upstream};
pub use recurrent::RecurrentLayer;
