use kidz_session::SlotKey;
use serde::Deserialize;

/// Dialogue tuning. The defaults carry the reference behavior; every value
/// here is configuration to be re-tuned empirically, not a constant the
/// code depends on.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Persona instruction sent as the first system message.
    pub persona: String,
    /// Small-talk trigger vocabulary (checked against normalized text).
    pub small_talk_vocab: Vec<String>,
    /// Messages longer than this never count as small talk, even when they
    /// open with a greeting.
    pub small_talk_max_chars: usize,
    /// Canned small-talk replies; no model call, no product content.
    pub small_talk_reply_ar: String,
    pub small_talk_reply_en: String,
    /// Domain vocabulary: any hit routes the turn to the domain-query path.
    pub domain_vocab: Vec<String>,
    /// Upper bound on practical steps the model may give.
    pub max_advice_steps: usize,
    /// Catalog items attached as supporting context.
    pub catalog_limit: usize,
    /// Output cap for every composed request.
    pub max_output_tokens: u32,
    /// Light promotion hint for the generic path.
    pub promo_hint: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            persona: "أنتِ مساعدة ودودة لعلامة SmartKidz لمنتجات العناية بشعر وبشرة الأطفال. \
                      ردي باختصار وبلهجة مصرية بسيطة، والتزمي بالحقائق المعطاة لكِ فقط."
                .to_string(),
            small_talk_vocab: [
                "هاي", "هلا", "اهلا", "السلام عليكم", "صباح الخير", "مساء الخير", "ازيك",
                "شكرا", "مع السلامه", "باي", "hi", "hello", "hey", "thanks", "thank you",
                "bye", "how are you",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            small_talk_max_chars: 24,
            small_talk_reply_ar: "أهلًا بيكي! 😊 أنا هنا أساعدك في أي سؤال عن شعر طفلك. \
                                  تحبي تحكيلي عن احتياجه؟"
                .to_string(),
            small_talk_reply_en: "Hi there! 😊 I'm here to help with your child's hair care. \
                                  What would you like to know?"
                .to_string(),
            domain_vocab: [
                "شعر", "شعره", "شعرها", "فروه", "بشره", "شامبو", "كريم", "زيت", "هيشان",
                "جفاف", "تقصف", "قشره", "تساقط", "تشابك", "استحمام", "hair", "scalp",
                "shampoo", "cream", "oil", "frizz",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_advice_steps: 3,
            catalog_limit: 2,
            max_output_tokens: 400,
            promo_hint: "لو جه سياق مناسب، اذكري بلطف إن عندنا باقات وعروض حالية من غير إلحاح."
                .to_string(),
        }
    }
}

impl PolicyConfig {
    /// The clarifying question posed for a missing slot.
    #[must_use]
    pub fn question_for(&self, slot: SlotKey) -> &str {
        match slot {
            SlotKey::Age => "قد ايه عمر الطفل؟",
            SlotKey::HairType => "شعره ناعم ولا كيرلي ولا خشن؟",
            SlotKey::Concern => "ايه اكتر حاجه مضايقاكي في شعره؟",
            SlotKey::Audience => "الاستخدام هيكون لمين؟",
        }
    }
}
