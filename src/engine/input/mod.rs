// Input intent
//
// Device polling lives outside this crate. Whatever drives a character (a
// player's input layer or an AI) produces one `CharacterIntent` per frame,
// which `CharacterManager::apply_intent` turns into movement and attacks.

pub mod intent;

pub use intent::CharacterIntent;
