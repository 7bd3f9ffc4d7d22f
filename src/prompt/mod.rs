use crate::wire::Product;

pub fn system_prompt_routine() -> &'static str {
r#"You are a beauty and skincare expert assistant. Create a personalized routine using the provided products. Include step-by-step instructions, recommended order of use, and helpful tips. Be specific about how to use each product and when to use them (morning/evening). You must ONLY discuss beauty products, skincare routines, makeup, haircare, and related beauty topics like questions having to do with the user's own self (like personal features/preferences). If asked about anything outside of beauty and cosmetics, politely redirect the conversation back to beauty routines and products."#
}

pub fn system_prompt_chat() -> &'static str {
r#"You are a beauty and skincare expert assistant specialized in helping users with beauty routines, skincare, makeup, haircare, and cosmetic products. You must ONLY answer questions related to beauty, skincare, makeup, haircare, fragrance, and cosmetic routines. If a user asks about anything outside of beauty and cosmetics (such as cooking, sports, politics, general knowledge, etc.), you must politely decline and redirect them back to beauty-related topics. Always respond with something like: 'I'm here to help you with beauty routines and cosmetic products. Let's focus on your skincare, makeup, or haircare needs. Do you have any questions about your routine or the products you've selected?'"#
}

/// `"<name> by <brand> - <description>"` for each product, joined with `"; "`.
pub fn user_prompt_routine(selection: &[Product]) -> String {
    let items = selection
        .iter()
        .map(|p| format!("{} by {} - {}", p.name, p.brand, p.description))
        .collect::<Vec<_>>()
        .join("; ");
    format!(
        "Please create a personalized routine using these selected products: {}. Please provide detailed steps on how to use these products together effectively.",
        items
    )
}

/// Chat system prompt, with the selection named once a routine exists.
pub fn system_prompt_chat_with(selection: &[Product], routine_active: bool) -> String {
    let mut prompt = system_prompt_chat().to_string();
    if routine_active && !selection.is_empty() {
        let names = selection
            .iter()
            .map(|p| format!("{} by {}", p.name, p.brand))
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!(
            " The user has selected these products: {}. Help them with questions about their routine or these specific products.",
            names
        ));
    }
    prompt
}
