use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

/// Number of hotbar slots bound to the digit keys `1..=9`.
pub const HOTBAR_SLOTS: u8 = 9;

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    #[actionlike(DualAxis)]
    Move,
    Jump,
    Sneak,
    Sprint,
    /// Equip the archetype in this hotbar slot (0-based).
    Hotbar(u8),
    /// Clear the current identity.
    Unequip,
}

const DIGITS: [KeyCode; HOTBAR_SLOTS as usize] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

pub fn input_map() -> InputMap<InputAction> {
    let mut input_map = InputMap::<InputAction>::default();
    input_map.insert_dual_axis(InputAction::Move, VirtualDPad::wasd());
    input_map.insert(InputAction::Jump, KeyCode::Space);
    input_map.insert(InputAction::Sneak, KeyCode::ShiftLeft);
    input_map.insert(InputAction::Sprint, KeyCode::ControlLeft);
    input_map.insert(InputAction::Unequip, KeyCode::Digit0);
    for (slot, key) in (0..HOTBAR_SLOTS).zip(DIGITS) {
        input_map.insert(InputAction::Hotbar(slot), key);
    }
    input_map
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<InputAction>::default());

    app.register_type::<InputAction>();

    app.insert_resource(input_map());
    app.insert_resource(ActionState::<InputAction>::default());
}
