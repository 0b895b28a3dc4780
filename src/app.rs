//! Page layout for rateware.
//! The whole page is rendered on the server; there is no client-side bundle.
use leptos::*;
use crate::components::review_form::ReviewForm;
use crate::models::prediction::Prediction;
use crate::oracle::TF_IDF_FLAG;

/// Everything the page needs to render once.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub text: String,
    pub selected_model: String,
    pub prediction: Option<Prediction>,
}

impl PageState {
    /// Blank form as shown on GET.
    pub fn empty() -> Self {
        Self {
            selected_model: TF_IDF_FLAG.to_string(),
            ..Self::default()
        }
    }
}

#[component]
pub fn App(state: PageState) -> impl IntoView {
    view! {
        <main>
            <h1>{ "Review rating" }</h1>
            <ReviewForm
                text=state.text
                selected_model=state.selected_model
                prediction=state.prediction
            />
        </main>
    }
}

/// Renders the full HTML document for `state`.
pub fn render_page(state: PageState) -> String {
    let body = leptos::ssr::render_to_string(move || view! { <App state=state /> });
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"/>\
         <title>Review rating</title>\
         <link rel=\"stylesheet\" href=\"/assets/main.css\"/></head>\
         <body>{}</body></html>",
        body
    )
}
