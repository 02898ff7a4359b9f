pub mod channel;
pub mod command;
pub mod frame;
pub mod header;
pub mod predictor;
pub mod wave;
