pub mod dispatch;

pub use dispatch::{Backend, dispatch, select_backend};
