//! Widget stylesheet, injected once per hosting document.

use crate::transcript::Document;

/// Fixed element id guarding against duplicate injection.
pub const WIDGET_STYLE_ID: &str = "chatdock-widget-styles";

pub(crate) const WIDGET_CSS: &str = "\
#chatdock-container { position: fixed; bottom: 20px; right: 20px; z-index: 99999; }
.chatdock-button { width: 60px; height: 60px; border-radius: 50%; cursor: pointer; }
.chatdock-window { position: absolute; bottom: 75px; right: 0; width: 380px; height: 520px; display: none; flex-direction: column; overflow: hidden; }
.chatdock-window.open { display: flex; }
.chatdock-content { flex: 1; overflow-y: auto; display: flex; flex-direction: column; gap: 12px; }
.chatdock-message { padding: 12px 16px; border-radius: 16px; max-width: 85%; }
.chatdock-message.user { align-self: flex-end; }
.chatdock-message.bot { align-self: flex-start; }
.chatdock-loading { align-self: flex-start; }
.chatdock-message .cursor { animation: chatdock-blink 1s step-end infinite; }
@keyframes chatdock-blink { 50% { opacity: 0; } }
.chatdock-powered { text-align: center; font-size: 11px; }
";

/// Ensure the widget stylesheet is present in `doc`. Idempotent: the style
/// element is keyed by [`WIDGET_STYLE_ID`], so constructing a second widget
/// against the same document changes nothing. There is no teardown path.
pub fn ensure_styles(doc: &mut Document) -> bool {
    doc.inject_style(WIDGET_STYLE_ID, WIDGET_CSS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_injection_is_a_no_op() {
        let mut doc = Document::new();
        assert!(ensure_styles(&mut doc));
        assert!(!ensure_styles(&mut doc));
        assert!(doc.has_style(WIDGET_STYLE_ID));
    }
}
