use kidz_intent::ReplyPayload;

/// One deliverable unit for the outbound boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    ImageUrl(String),
}

impl Outbound {
    /// The text body, if this unit is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Outbound::Text(text) => Some(text),
            Outbound::ImageUrl(_) => None,
        }
    }
}

/// Render a matched intent payload verbatim, in fixed order:
/// title → description → highlights → image → gallery.
///
/// The payload is factual grounding; nothing is added or rephrased.
#[must_use]
pub fn render_payload(payload: &ReplyPayload) -> Vec<Outbound> {
    let mut body = String::new();
    body.push_str(&payload.title);
    body.push_str("\n\n");
    body.push_str(&payload.description);
    for highlight in &payload.highlights {
        body.push_str("\n• ");
        body.push_str(highlight);
    }

    let mut out = vec![Outbound::Text(body)];
    if let Some(image) = &payload.image {
        out.push(Outbound::ImageUrl(image.clone()));
    }
    for url in &payload.gallery {
        out.push(Outbound::ImageUrl(url.clone()));
    }
    out
}
