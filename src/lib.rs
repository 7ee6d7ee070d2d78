//! Core modules for the tumble engine.
//!
//! The crate exposes the building blocks of a small real-time 3D engine:
//! tween-driven animation primitives, an actor state machine that turns
//! discrete input into continuous rotations, a model/mesh aggregate with
//! an accumulated local transform, and a camera that composes the MVP
//! matrix per draw call.  Windowing and GPU submission live behind thin
//! seams so the core stays testable without a display.

pub mod actor;
pub mod animation;
pub mod camera;
pub mod clock;
pub mod input;
pub mod model;
pub mod obj;
pub mod render;
pub mod scene;

pub use actor::{default_controls, Actor, ActorState, Command, RotateButton};
pub use animation::{AnimationState, Curve, RotateAnimation, Tween};
pub use camera::{Camera, ZoomLimits};
pub use clock::Stopwatch;
pub use input::{InputMap, InputState, Key};
pub use model::{
    Material, MeshPart, Model, ModelArena, ModelHandle, Shading, TextureKind, TextureRef, Vertex,
};
pub use obj::{load_from_file, LoadError};
pub use render::{LightParams, Renderer};
pub use scene::Scene;
