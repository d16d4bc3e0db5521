//! Prompt templates for vision requests.

use crate::models::Marketplace;

/// System instruction shared by every request.
pub const SYSTEM_INSTRUCTION: &str = "\
You are an SEO specialist for print-on-demand marketplaces such as Spreadshirt, \
TeePublic and Zazzle. You look at a design and write listing metadata that helps \
buyers find it.

Rules:
- Describe the design itself: its subject, style, mood, and the audience it suits.
- Never use garment or product words such as t-shirt, shirt, tee, hoodie, sweater, \
mug, or apparel. The same design is sold on many products.
- Tags are short lowercase search phrases without a leading '#'.
- Do not repeat the same tag twice.
- Reply with a single JSON object and nothing else. No markdown, no commentary.";

/// Sampling temperature requested from every provider.
pub const TEMPERATURE: f32 = 0.7;

/// Builds the user prompt for a marketplace.
pub fn user_prompt(market: Marketplace) -> String {
    let c = market.constraints();
    match market {
        Marketplace::Spreadshirt => format!(
            "Write Spreadshirt metadata for this design.\n\
             - title: at most {} characters, catchy and descriptive\n\
             - description: at most {} characters\n\
             - tags: exactly {} relevant tags\n\n\
             Return JSON: {{\"title\": string, \"description\": string, \"tags\": [string]}}",
            c.title_max_chars,
            c.description_max_chars,
            c.tag_ceiling.unwrap_or(25),
        ),
        Marketplace::TeePublic => format!(
            "Write TeePublic metadata for this design.\n\
             - title: catchy, at most {} characters\n\
             - description: detailed and engaging, at most {} characters\n\
             - mainTag: the single most important search phrase for the design\n\
             - tags: exactly {} secondary tags; do not repeat the mainTag among them\n\n\
             Return JSON: {{\"title\": string, \"description\": string, \"mainTag\": string, \"tags\": [string]}}",
            c.title_max_chars,
            c.description_max_chars,
            c.tag_ceiling.unwrap_or(25),
        ),
        Marketplace::Zazzle => format!(
            "Write Zazzle metadata for this design.\n\
             - title: at most {} characters\n\
             - description: a few sentences, at most {} characters\n\
             - tags: up to {} tags, most relevant first\n\n\
             Return JSON: {{\"title\": string, \"description\": string, \"tags\": [string]}}",
            c.title_max_chars,
            c.description_max_chars,
            c.tag_ceiling.unwrap_or(10),
        ),
    }
}
