use maud::{DOCTYPE, Markup, html};

// Button styles
pub const BUTTON_PRIMARY_STYLE: &str = "button button-primary";
pub const BUTTON_SECONDARY_STYLE: &str = "button button-secondary";

// Form styles
pub const FORM_LABEL_STYLE: &str = "form-label";
pub const FORM_TEXT_INPUT_STYLE: &str = "form-input";

// Table styles
pub const TABLE_STYLE: &str = "records-table";

/// The HTML document shared by every page.
///
/// Loads the stylesheet and the front-end script from the static directory.
pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Ledger" }
                link href="/static/style.css" rel="stylesheet";
                script src="/static/app.js" defer {}
            }

            body
            {
                (content)
            }
        }
    }
}
