//! The single page of the front-end.
//!
//! The page is a static shell. `static/app.js` loads the categories and
//! records from the JSON API and draws the chart.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        TABLE_STYLE, base,
    },
};

/// A route handler for the front-end page.
pub async fn get_index_page() -> Response {
    Html(index_view().into_string()).into_response()
}

fn index_view() -> Markup {
    let content = html! {
        header class="page-header"
        {
            h1 { "Ledger" }

            nav class="tabs"
            {
                button id="tab-register" type="button" class=(BUTTON_SECONDARY_STYLE) { "Register" }
                button id="tab-list" type="button" class=(BUTTON_SECONDARY_STYLE) { "Records" }
                button id="tab-charts" type="button" class=(BUTTON_SECONDARY_STYLE) { "Chart" }
            }
        }

        main
        {
            (register_section())
            (list_section())
            (chart_section())
        }
    };

    base("Records", &content)
}

fn register_section() -> Markup {
    html! {
        section id="section-register" class="section active"
        {
            h2 { "New record" }

            form id="form-record"
            {
                label for="timestamp" class=(FORM_LABEL_STYLE) { "Date and time" }
                input id="timestamp" name="timestamp" type="datetime-local" class=(FORM_TEXT_INPUT_STYLE);

                label for="source" class=(FORM_LABEL_STYLE) { "Source" }
                input id="source" name="source" type="text" required
                    placeholder="Lanchonete da Cau" class=(FORM_TEXT_INPUT_STYLE);

                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                div class="inline-group"
                {
                    select id="category" name="category" required class=(FORM_TEXT_INPUT_STYLE) {}
                    button id="btn-add-category" type="button" class=(BUTTON_SECONDARY_STYLE) { "Add category" }
                }

                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                input id="amount" name="amount" type="number" min="0" step="0.01" required
                    class=(FORM_TEXT_INPUT_STYLE);

                label for="notes" class=(FORM_LABEL_STYLE) { "Notes" }
                textarea id="notes" name="notes" rows="2" class=(FORM_TEXT_INPUT_STYLE) {}

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }
        }
    }
}

fn list_section() -> Markup {
    html! {
        section id="section-list" class="section"
        {
            h2 { "Records" }

            div class="filters"
            {
                label for="f-from" class=(FORM_LABEL_STYLE) { "From" }
                input id="f-from" type="date" class=(FORM_TEXT_INPUT_STYLE);

                label for="f-to" class=(FORM_LABEL_STYLE) { "To" }
                input id="f-to" type="date" class=(FORM_TEXT_INPUT_STYLE);

                label for="f-source" class=(FORM_LABEL_STYLE) { "Source" }
                input id="f-source" type="text" class=(FORM_TEXT_INPUT_STYLE);

                label for="f-category" class=(FORM_LABEL_STYLE) { "Category" }
                input id="f-category" type="text" class=(FORM_TEXT_INPUT_STYLE);

                button id="btn-filter" type="button" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
                a id="btn-export" href=(endpoints::RECORDS_EXPORT) class=(BUTTON_SECONDARY_STYLE) { "Export CSV" }
            }

            table id="table-records" class=(TABLE_STYLE)
            {
                thead
                {
                    tr
                    {
                        th { "Date" }
                        th { "Source" }
                        th { "Category" }
                        th { "Amount" }
                        th { "Notes" }
                        th {}
                    }
                }

                tbody {}
            }
        }
    }
}

fn chart_section() -> Markup {
    html! {
        section id="section-charts" class="section"
        {
            h2 { "Totals by category" }
            canvas id="chart" width="800" height="400" {}
        }
    }
}
