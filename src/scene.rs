use crate::actor::Actor;
use crate::camera::Camera;
use crate::input::InputState;
use crate::model::{Model, ModelArena, ModelHandle};

/// Everything the frame loop touches: the model arena, a flat list of
/// actors, and the camera.
///
/// Per frame the loop calls `handle_input` then `update`, in that order,
/// before handing the scene to the renderer. Actors sharing a model
/// handle share its rotation state.
#[derive(Debug, Default)]
pub struct Scene {
    pub models: ModelArena,
    pub actors: Vec<Actor>,
    pub camera: Camera,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_model(&mut self, model: Model) -> ModelHandle {
        self.models.insert(model)
    }

    pub fn add_actor(&mut self, actor: Actor) {
        self.actors.push(actor);
    }

    /// Inserts the model and an idle actor driving it.
    pub fn spawn(&mut self, model: Model) -> ModelHandle {
        let handle = self.add_model(model);
        self.add_actor(Actor::new(handle));
        handle
    }

    /// Delivers the input snapshot to every actor; commands returned by
    /// their states are executed before `update` runs.
    pub fn handle_input(&mut self, input: &InputState) {
        for actor in &mut self.actors {
            actor.handle_input(input);
        }
    }

    /// Advances every actor by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        for actor in &mut self.actors {
            actor.update(dt, &mut self.models);
        }
    }
}
