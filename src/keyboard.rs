use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::presenter::Button;

/// One callback button per row, in display order.
pub(crate) fn answers_keyboard(buttons: &[Button]) -> Option<InlineKeyboardMarkup> {
    if buttons.is_empty() {
        return None;
    }

    let keyboard: Vec<Vec<InlineKeyboardButton>> = buttons
        .iter()
        .map(|button| {
            vec![InlineKeyboardButton::callback(
                button.label.clone(),
                button.payload.clone(),
            )]
        })
        .collect();

    Some(InlineKeyboardMarkup::new(keyboard))
}
