pub mod config;
pub mod core;
pub mod io;
pub mod runtime;
pub mod song;
pub mod surface;

pub use config::SurfaceConfig;
pub use surface::ControlSurface;
