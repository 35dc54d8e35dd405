use bevy_ecs::prelude::*;
use bevy_input::{keyboard::KeyCode, mouse::MouseButton, ButtonInput};
use bevy_reflect::{Reflect, TypePath};

use crate::{ArcCaster, PullPerformed};

/// A button that can trigger a pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum PullButton {
    Key(KeyCode),
    Mouse(MouseButton),
}

/// Binds a button to a caster. Pressing it sends a [`PullPerformed`] for the caster's entity.
///
/// Hosts with their own input handling (e.g. XR controllers) can skip this component and send
/// [`PullPerformed`] themselves.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct PullAction {
    pub button: PullButton,
    enabled: bool,
}

impl PullAction {
    pub fn new(button: PullButton) -> Self {
        PullAction {
            button,
            enabled: true,
        }
    }

    pub fn key(key: KeyCode) -> Self {
        PullAction::new(PullButton::Key(key))
    }

    pub fn mouse(button: MouseButton) -> Self {
        PullAction::new(PullButton::Mouse(button))
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn just_pressed(
        &self,
        keys: Option<&ButtonInput<KeyCode>>,
        mouse: Option<&ButtonInput<MouseButton>>,
    ) -> bool {
        match self.button {
            PullButton::Key(key) => keys.is_some_and(|keys| keys.just_pressed(key)),
            PullButton::Mouse(button) => mouse.is_some_and(|mouse| mouse.just_pressed(button)),
        }
    }
}

/// Sends a [`PullPerformed`] for every enabled [`PullAction`] whose button was just pressed.
pub fn read_pull_actions<T: TypePath + Send + Sync>(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mouse: Option<Res<ButtonInput<MouseButton>>>,
    actions: Query<(Entity, &PullAction), With<ArcCaster<T>>>,
    mut performed: EventWriter<PullPerformed>,
) {
    for (caster, action) in &actions {
        if action.enabled && action.just_pressed(keys.as_deref(), mouse.as_deref()) {
            performed.send(PullPerformed { caster });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_action_is_reported() {
        let mut action = PullAction::key(KeyCode::Space);
        assert!(action.is_enabled());
        action.disable();
        assert!(!action.is_enabled());
        action.enable();
        assert!(action.is_enabled());
    }

    #[test]
    fn only_the_bound_button_triggers() {
        let mut keys = ButtonInput::<KeyCode>::default();
        keys.press(KeyCode::KeyE);
        let mouse = ButtonInput::<MouseButton>::default();

        assert!(PullAction::key(KeyCode::KeyE).just_pressed(Some(&keys), Some(&mouse)));
        assert!(!PullAction::key(KeyCode::Space).just_pressed(Some(&keys), Some(&mouse)));
        assert!(!PullAction::mouse(MouseButton::Left).just_pressed(Some(&keys), Some(&mouse)));
        assert!(!PullAction::key(KeyCode::KeyE).just_pressed(None, Some(&mouse)));
    }
}
