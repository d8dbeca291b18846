//! System and user prompts for design generation.

use std::fmt::Write as _;

use super::DesignBrief;

/// Built-in layout templates and the direction they give the model.
const TEMPLATES: &[(&str, &str)] = &[
    ("minimal", "Minimal layout: generous whitespace, one focal element, restrained type."),
    ("bold", "Bold layout: oversized headline, high-contrast color blocks, strong call to action."),
    ("elegant", "Elegant layout: serif headings, thin rules, muted palette, centered composition."),
    ("retro", "Retro layout: warm tones, textured shapes, playful display type."),
    ("corporate", "Corporate layout: clean grid, sans-serif type, clear hierarchy, brand colors."),
    ("event", "Event flyer: date, time and venue prominent, headline at top, details grouped."),
    ("sale", "Sale promotion: discount figure dominant, urgency cues, product focus."),
];

/// Direction text for a template id; unknown ids are passed through verbatim.
#[must_use]
pub fn template_direction(template_id: &str) -> String {
    TEMPLATES
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(template_id))
        .map_or_else(
            || format!("Follow the \"{template_id}\" template style."),
            |(_, direction)| (*direction).to_string(),
        )
}

/// Build the system prompt for a brief.
#[must_use]
pub fn system_prompt(brief: &DesignBrief<'_>) -> String {
    let viewport = brief.aspect_ratio.viewport();
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(
        "You are an expert graphic designer who builds marketing designs as HTML with Tailwind CSS.\n\n",
    );

    let _ = writeln!(prompt, "## Canvas");
    let _ = writeln!(
        prompt,
        "- Aspect ratio {} ({}), exactly {}x{} pixels.",
        brief.aspect_ratio,
        brief.aspect_ratio.orientation(),
        viewport.width,
        viewport.height
    );
    let _ = writeln!(
        prompt,
        "- The root element must be <div class=\"flyer-container\"> with width {}px and height {}px and overflow hidden.",
        viewport.width, viewport.height
    );
    prompt.push_str("- Tailwind CSS is loaded from its CDN; any extra CSS goes in the \"css\" field.\n");
    prompt.push_str("- Do not reference external scripts. Images must use absolute https URLs.\n");

    if let Some(template_id) = brief.template_id {
        let _ = writeln!(prompt, "\n## Template\n- {}", template_direction(template_id));
    }

    if let Some(kit) = brief.brand_kit {
        let _ = writeln!(prompt, "\n## Brand kit \"{}\"", kit.name);
        let _ = writeln!(
            prompt,
            "- Colors: primary {}, secondary {}, accent {}. Use them as the dominant palette.",
            kit.primary_color, kit.secondary_color, kit.accent_color
        );
        if let Some(font) = &kit.heading_font {
            let _ = writeln!(prompt, "- Heading font: {font} (load it from Google Fonts via @import in css).");
        }
        if let Some(font) = &kit.body_font {
            let _ = writeln!(prompt, "- Body font: {font}.");
        }
    }

    if brief.background_image_url.is_some() {
        prompt.push_str(
            "\n## Background\n- A background photo is layered beneath your design. Keep the root background transparent and ensure text stays legible over it.\n",
        );
    }

    if brief.effective_logo_url().is_some() {
        prompt.push_str(
            "\n## Logo\n- The brand logo is overlaid in the top-left corner (about 15% of the width). Leave that area clear.\n",
        );
    }

    if !brief.inspiration.is_empty() {
        prompt.push_str("\n## Inspiration\nDraw on the style (not the wording) of these ads:\n");
        for ad in brief.inspiration {
            let _ = writeln!(prompt, "- {}", ad.summary());
        }
    }

    prompt.push_str(
        "\n## Output\nReply with a single JSON object and nothing else:\n\
         {\"html\": \"<div class=\\\"flyer-container\\\">...</div>\", \"css\": \"...\", \
         \"headline\": \"main headline text\", \"content\": \"supporting copy\"}\n",
    );

    prompt
}

/// Build the user turn for a brief.
#[must_use]
pub fn user_prompt(brief: &DesignBrief<'_>) -> String {
    format!("Create this design:\n\n{}", brief.prompt.trim())
}
