// All LLM prompt templates for the analysis agents.
// System prompts are assembled with llm_client::prompts::build_system.

pub const SENTIMENT_INSTRUCTION: &str = "\
مهمتك تحليل مشاعر العميل في النص التالي بدقة. \
Score sentiment from -1.0 (very negative) to 1.0 (very positive). \
Account for sarcasm, dialect expressions and mixed feelings.";

/// Replace `{text}` before sending.
pub const SENTIMENT_PROMPT_TEMPLATE: &str = r#"حلل مشاعر العميل في النص التالي:

النص:
"{text}"

Return a JSON object with this EXACT schema:
{
  "sentiment_score": -0.6,
  "confidence": 0.85,
  "emotion": "frustration",
  "intensity": 0.7,
  "reasoning": "شرح مختصر بالعربية لسبب التقييم"
}

Rules:
- sentiment_score: number between -1.0 and 1.0
- confidence: number between 0.0 and 1.0
- emotion: one of "joy", "satisfaction", "gratitude", "neutral", "confusion", "disappointment", "frustration", "anger"
- intensity: number between 0.0 and 1.0
- reasoning: one or two sentences in Arabic"#;

pub const TOPIC_INSTRUCTION: &str = "\
مهمتك تصنيف ملاحظة العميل وتحديد موضوعاتها ومدى إلحاحها. \
Use the sentiment context you are given to judge urgency.";

/// Replace `{text}`, `{emotion}`, `{sentiment_score}` before sending.
pub const TOPIC_PROMPT_TEMPLATE: &str = r#"صنّف ملاحظة العميل التالية:

النص:
"{text}"

سياق المشاعر (من تحليل سابق):
- emotion: {emotion}
- sentiment_score: {sentiment_score}

Return a JSON object with this EXACT schema:
{
  "primary_category": "delivery",
  "secondary_categories": ["customer_service"],
  "topics": ["تأخير التوصيل", "عدم الرد على الاتصالات"],
  "urgency_level": "high",
  "requires_action": true,
  "customer_type": "returning"
}

Rules:
- primary_category and secondary_categories: from "product_quality", "customer_service", "delivery", "pricing", "billing", "website_app", "staff_behavior", "cleanliness", "waiting_time", "general"
- topics: short Arabic phrases naming what the customer talks about
- urgency_level: one of "low", "medium", "high", "critical"
- customer_type: one of "new", "returning", "loyal", "at_risk", "unknown""#;

pub const ACTION_INSTRUCTION: &str = "\
مهمتك اقتراح إجراءات عملية يتخذها فريق خدمة العملاء بناءً على الملاحظة وتحليلها. \
Actions must be concrete, short and written in Arabic.";

/// Replace `{text}`, `{emotion}`, `{sentiment_score}`, `{primary_category}`,
/// `{urgency_level}`, `{topics}` before sending.
pub const ACTION_PROMPT_TEMPLATE: &str = r#"اقترح إجراءات للتعامل مع ملاحظة العميل التالية:

النص:
"{text}"

التحليل السابق:
- emotion: {emotion}
- sentiment_score: {sentiment_score}
- primary_category: {primary_category}
- urgency_level: {urgency_level}
- topics: {topics}

Return a JSON object with this EXACT schema:
{
  "immediate_actions": ["الاتصال بالعميل خلال 24 ساعة للاعتذار"],
  "follow_up_actions": ["متابعة حالة الطلب حتى التسليم"],
  "prevention_actions": ["مراجعة أوقات التوصيل مع شركة الشحن"],
  "escalation_required": true
}

Rules:
- each list holds 0 to 3 short Arabic actions
- escalation_required is true only for severe complaints, legal or safety issues, or critical urgency"#;

/// Escapes double quotes so customer text cannot close the quoted block.
pub fn quote_text(text: &str) -> String {
    text.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_carry_placeholders() {
        assert!(SENTIMENT_PROMPT_TEMPLATE.contains("{text}"));
        for placeholder in ["{text}", "{emotion}", "{sentiment_score}"] {
            assert!(TOPIC_PROMPT_TEMPLATE.contains(placeholder));
        }
        for placeholder in [
            "{text}",
            "{emotion}",
            "{sentiment_score}",
            "{primary_category}",
            "{urgency_level}",
            "{topics}",
        ] {
            assert!(ACTION_PROMPT_TEMPLATE.contains(placeholder));
        }
    }

    #[test]
    fn test_quote_text_escapes_quotes() {
        assert_eq!(quote_text(r#"قال "سيء""#), r#"قال \"سيء\""#);
    }
}
