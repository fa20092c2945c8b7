//! A terminal endless runner steered by your voice.
//!
//! Low sounds make the dinosaur run, high sounds make it jump. The game core
//! ([`game::GameLoop`]) is independent of the terminal and the audio device:
//! it reads band energy through [`audio::EnergySource`] and drives the body
//! through [`game::CharacterActuator`].

pub mod arcade;
pub mod audio;
pub mod config;
pub mod control;
pub mod error;
pub mod game;
pub mod logging;
pub mod render;
pub mod run_state;
pub mod sfx;
pub mod world;

pub use config::Tuning;
pub use error::{AudioError, ConfigError};
pub use game::{GameLoop, RunContext, StepReport};
pub use run_state::RunState;
