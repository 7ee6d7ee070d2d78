use std::f64::consts::FRAC_PI_2;

use glam::Vec3;

use crate::animation::{Curve, RotateAnimation, Tween};
use crate::input::{InputMap, InputState, Key};
use crate::model::{ModelArena, ModelHandle};

/// Time scale of the quarter-turn roll: a full bout takes half a second.
const TURN_SPEED: f64 = 2.0;

/// Logical buttons the default control map resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateButton {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl RotateButton {
    pub fn axis(self) -> Vec3 {
        match self {
            RotateButton::PositiveX => Vec3::X,
            RotateButton::NegativeX => -Vec3::X,
            RotateButton::PositiveY => Vec3::Y,
            RotateButton::NegativeY => -Vec3::Y,
            RotateButton::PositiveZ => Vec3::Z,
            RotateButton::NegativeZ => -Vec3::Z,
        }
    }
}

/// Arrow keys roll about X and Z; holding shift remaps left/right to the
/// Y axis. Binding order doubles as the tie-break priority.
pub fn default_controls() -> InputMap<RotateButton> {
    let mut map = InputMap::new();
    map.bind(Key::Left, RotateButton::PositiveX);
    map.bind(Key::Right, RotateButton::NegativeX);
    map.bind(Key::Up, RotateButton::PositiveZ);
    map.bind(Key::Down, RotateButton::NegativeZ);
    map.set_modifier(Key::LeftShift);
    map.bind_modified(Key::Right, RotateButton::PositiveY);
    map.bind_modified(Key::Left, RotateButton::NegativeY);
    map
}

/// One-shot transition descriptor returned by `handle_input` and consumed
/// immediately by [`Actor::apply`]. States never swap themselves in
/// directly; every transition passes through a command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ReturnToIdle,
    RotateAbout(Vec3),
}

/// The behavior state of an actor.
///
/// A closed set dispatched by `match`: the machine cycles between `Idle`
/// and `Rotating` indefinitely, driven by input and animation completion.
#[derive(Debug, Clone)]
pub enum ActorState {
    Idle,
    Rotating(RotatingState),
}

impl ActorState {
    fn handle_input(
        &self,
        input: &InputState,
        controls: Option<&InputMap<RotateButton>>,
    ) -> Option<Command> {
        match self {
            // Idle translates mapped buttons into a rotation command.
            ActorState::Idle => controls?
                .resolve(input)
                .map(|button| Command::RotateAbout(button.axis())),
            // Rotating ignores raw input; it only reports completion.
            ActorState::Rotating(state) => state
                .animation
                .is_complete()
                .then_some(Command::ReturnToIdle),
        }
    }
}

/// In-flight quarter-turn roll about a fixed axis.
#[derive(Debug, Clone)]
pub struct RotatingState {
    animation: RotateAnimation,
    last_angle: f64,
}

impl RotatingState {
    fn quarter_turn(axis: Vec3) -> Self {
        Self {
            animation: RotateAnimation::new(
                Tween::new(0.0, FRAC_PI_2),
                Curve::Linear,
                axis,
            )
            .with_speed(TURN_SPEED),
            last_angle: 0.0,
        }
    }

    pub fn axis(&self) -> Vec3 {
        self.animation.axis()
    }

    pub fn progress(&self) -> f64 {
        self.animation.progress()
    }
}

/// A drawable model paired with a behavior state machine.
///
/// The actor stores a handle into the scene's model arena rather than a
/// pointer, so model sharing between actors stays explicit.
#[derive(Debug)]
pub struct Actor {
    model: ModelHandle,
    state: ActorState,
    controls: Option<InputMap<RotateButton>>,
}

impl Actor {
    /// Creates an idle actor with the default control map.
    pub fn new(model: ModelHandle) -> Self {
        Self {
            model,
            state: ActorState::Idle,
            controls: Some(default_controls()),
        }
    }

    pub fn set_controls(&mut self, controls: Option<InputMap<RotateButton>>) {
        self.controls = controls;
    }

    pub fn model(&self) -> ModelHandle {
        self.model
    }

    /// Replaces the model reference without touching the current
    /// animation state.
    pub fn set_model(&mut self, model: ModelHandle) {
        self.model = model;
    }

    pub fn state(&self) -> &ActorState {
        &self.state
    }

    /// Replaces the current state; the previous one is discarded.
    pub fn set_state(&mut self, state: ActorState) {
        self.state = state;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ActorState::Idle)
    }

    /// Polls the current state for a command and executes it immediately,
    /// so a transition takes effect before this frame's `update`.
    pub fn handle_input(&mut self, input: &InputState) {
        if let Some(command) = self.state.handle_input(input, self.controls.as_ref()) {
            self.apply(command);
        }
    }

    /// Executes a one-shot command against this actor.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::ReturnToIdle => self.set_state(ActorState::Idle),
            Command::RotateAbout(axis) => {
                self.set_state(ActorState::Rotating(RotatingState::quarter_turn(axis)));
            }
        }
    }

    /// Advances time-based effects, applying this frame's rotation delta
    /// to the actor's model.
    pub fn update(&mut self, dt: f64, models: &mut ModelArena) {
        match &mut self.state {
            ActorState::Idle => {}
            ActorState::Rotating(state) => {
                let angle = state.animation.update(dt);
                let delta = angle - state.last_angle;
                state.last_angle = angle;
                if let Some(model) = models.get_mut(self.model) {
                    model.rotate(delta as f32, state.animation.axis());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use std::f32::consts::FRAC_PI_2 as QUARTER_TURN;

    fn cube_scene() -> (ModelArena, Actor) {
        let mut arena = ModelArena::new();
        let handle = arena.insert(Model::unit_cube());
        (arena, Actor::new(handle))
    }

    fn frame(actor: &mut Actor, models: &mut ModelArena, input: &InputState, dt: f64) {
        actor.handle_input(input);
        actor.update(dt, models);
    }

    #[test]
    fn idle_actor_does_not_evolve_over_time() {
        let (mut arena, mut actor) = cube_scene();
        let input = InputState::new();
        frame(&mut actor, &mut arena, &input, 10.0);
        assert!(actor.is_idle());
        let rotation = arena.get(actor.model()).unwrap().rotation();
        assert!(rotation.abs_diff_eq(glam::Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn idle_to_rotating_to_idle() {
        let (mut arena, mut actor) = cube_scene();
        let input = InputState::new();

        input.set_key_down(Key::Right);
        frame(&mut actor, &mut arena, &input, 0.0);
        let ActorState::Rotating(state) = actor.state() else {
            panic!("expected rotating state");
        };
        assert_eq!(state.axis(), -Vec3::X);
        assert_eq!(state.progress(), 0.0);
        input.set_key_up(Key::Right);

        // Full duration in one step: exactly a quarter turn.
        frame(&mut actor, &mut arena, &input, 0.5);
        let (axis, angle) = arena.get(actor.model()).unwrap().orientation();
        assert!(axis.abs_diff_eq(-Vec3::X, 1e-5));
        assert!((angle - QUARTER_TURN).abs() < 1e-5);

        // Completion is observed by the next poll.
        frame(&mut actor, &mut arena, &input, 0.0);
        assert!(actor.is_idle());
    }

    #[test]
    fn fresh_rotating_state_integrates_on_its_entry_frame() {
        let (mut arena, mut actor) = cube_scene();
        let input = InputState::new();
        input.set_key_down(Key::Up);
        frame(&mut actor, &mut arena, &input, 0.1);
        let rotation = arena.get(actor.model()).unwrap().rotation();
        assert!(!rotation.abs_diff_eq(glam::Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn directional_input_is_ignored_while_rotating() {
        let (mut arena, mut actor) = cube_scene();
        let input = InputState::new();

        input.set_key_down(Key::Right);
        frame(&mut actor, &mut arena, &input, 0.1);
        input.set_key_up(Key::Right);

        input.set_key_down(Key::Up);
        let before = match actor.state() {
            ActorState::Rotating(state) => (state.axis(), state.progress()),
            ActorState::Idle => panic!("expected rotating state"),
        };
        actor.handle_input(&input);
        let after = match actor.state() {
            ActorState::Rotating(state) => (state.axis(), state.progress()),
            ActorState::Idle => panic!("rotation must not be interrupted"),
        };
        assert_eq!(before, after);
    }

    #[test]
    fn shift_remaps_to_the_third_axis() {
        let (mut arena, mut actor) = cube_scene();
        let input = InputState::new();
        input.set_key_down(Key::LeftShift);
        input.set_key_down(Key::Right);
        frame(&mut actor, &mut arena, &input, 0.0);
        let ActorState::Rotating(state) = actor.state() else {
            panic!("expected rotating state");
        };
        assert_eq!(state.axis(), Vec3::Y);
    }

    #[test]
    fn simultaneous_keys_resolve_by_binding_order() {
        let (mut arena, mut actor) = cube_scene();
        let input = InputState::new();
        input.set_key_down(Key::Up);
        input.set_key_down(Key::Left);
        frame(&mut actor, &mut arena, &input, 0.0);
        let ActorState::Rotating(state) = actor.state() else {
            panic!("expected rotating state");
        };
        // Left is bound before Up in the default map.
        assert_eq!(state.axis(), Vec3::X);
    }

    #[test]
    fn actor_without_controls_stays_idle() {
        let (mut arena, mut actor) = cube_scene();
        actor.set_controls(None);
        let input = InputState::new();
        input.set_key_down(Key::Left);
        frame(&mut actor, &mut arena, &input, 0.1);
        assert!(actor.is_idle());
    }

    #[test]
    fn replacing_the_model_keeps_the_animation_state() {
        let (mut arena, mut actor) = cube_scene();
        let other = arena.insert(Model::unit_cube());
        let input = InputState::new();
        input.set_key_down(Key::Down);
        frame(&mut actor, &mut arena, &input, 0.1);

        actor.set_model(other);
        assert!(matches!(actor.state(), ActorState::Rotating(_)));
        input.set_key_up(Key::Down);
        frame(&mut actor, &mut arena, &input, 0.4);

        // The remainder of the roll lands on the new model.
        let (_, angle) = arena.get(other).unwrap().orientation();
        assert!(angle > 0.0);
    }
}
