use leptos::*;
use crate::models::prediction::Prediction;
use crate::oracle::TF_IDF_FLAG;

/// Model choices offered in the form: (flag value, label).
pub const MODEL_OPTIONS: [(&str, &str); 2] = [(TF_IDF_FLAG, "TF-IDF"), ("bow", "Bag of words")];

#[component]
pub fn ReviewForm(
    text: String,
    selected_model: String,
    prediction: Option<Prediction>,
) -> impl IntoView {
    let sentiment = prediction
        .map(|p| p.sentiment.to_string())
        .unwrap_or_default();
    let rating = prediction
        .map(|p| p.rating.to_string())
        .unwrap_or_default();

    let options = MODEL_OPTIONS
        .iter()
        .map(|(value, label)| {
            let selected = *value == selected_model;
            view! {
                <option value={*value} selected={selected}>{ *label }</option>
            }
        })
        .collect::<Vec<_>>();

    view! {
        <form method="post" action="/" class="review-form">
            <h3>{ "Submit Review" }</h3>
            <textarea name="text" rows="8" placeholder="Write your review here">{ text }</textarea>
            <select name="model">{ options }</select>
            <button type="submit">{ "Predict" }</button>
        </form>
        <div class="prediction">
            <p>
                { "Sentiment: " }
                <span id="sentiment" data-sentiment={sentiment.clone()}>{ sentiment }</span>
            </p>
            <p>
                { "Rating: " }
                <span id="rating" data-rating={rating.clone()}>{ rating }</span>
            </p>
        </div>
    }
}
