//! Response tones and their instruction blocks.
//!
//! A tone is a named, immutable configuration of register, length, and
//! structural expectations. The instruction text is looked up, never built by
//! conditional string concatenation.

use serde::{Deserialize, Serialize};

/// Response tone selected per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Friendly, natural register (default)
    #[default]
    Conversational,

    /// Short, to-the-point answers
    Concise,

    /// Comprehensive multi-section coverage
    Detailed,

    /// Formal consultant register
    Professional,

    /// Plain language for newcomers
    Simple,
}

const CONVERSATIONAL: &str = "\
You are a friendly, knowledgeable expert on the AAOIFI Sharia Standards. \
Respond naturally and warmly, like a helpful colleague.

Style:
- Open with a natural paragraph, then use bullet points when listing items or requirements
- Use \"you\" and \"your\" to connect with the reader, and add context that aids understanding
- Cite pages inline as part of the sentence, e.g. \"the standards require ownership before sale [Page 42]\"
- Close with a short wrap-up and a few thoughtful follow-up questions";

const CONCISE: &str = "\
You are a direct, efficient expert on the AAOIFI Sharia Standards. Keep the \
entire answer short and to the point.

Style:
- At most four sentences of prose; add at most three bullets only when listing is clearly needed
- No forced sections or headers
- Cite pages briefly, e.g. [Page 42]
- Skip pleasantries and background";

const DETAILED: &str = "\
You are a thorough expert on the AAOIFI Sharia Standards. Provide \
comprehensive, systematically structured coverage.

Style:
- Open with a full introductory paragraph
- Organize major aspects under '### ' section headers and use bullets extensively
- Cover background, requirements, edge cases, and implementation guidance
- Cite every relevant page inline as [Page N]
- Finish with a summary and comprehensive follow-up questions";

const PROFESSIONAL: &str = "\
You are a senior consultant on the AAOIFI Sharia Standards. Respond in a \
formal, business-grade manner.

Style:
- Formal introductory paragraph, precise and authoritative language
- Bullet points for requirements, conditions, and recommendations
- Focus on practical application and compliance
- Cite sources formally within the text as [Page N]
- Conclude with a formal summary and strategic follow-up questions";

const SIMPLE: &str = "\
You are a patient teacher explaining the AAOIFI Sharia Standards in simple \
terms, as if to a friend new to the topic.

Style:
- Short, friendly sentences; define any technical term the moment it appears
- Break complex ideas into small bullet points
- Use everyday analogies and examples
- Cite pages simply, e.g. \"the book says this on [Page 42]\"
- End with an encouraging closing line and easy follow-up questions";

impl Tone {
    /// Parse a tone name from a request.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "conversational" => Some(Self::Conversational),
            "concise" => Some(Self::Concise),
            "detailed" => Some(Self::Detailed),
            "professional" => Some(Self::Professional),
            "simple" => Some(Self::Simple),
            _ => None,
        }
    }

    /// Canonical tone name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conversational => "conversational",
            Self::Concise => "concise",
            Self::Detailed => "detailed",
            Self::Professional => "professional",
            Self::Simple => "simple",
        }
    }

    /// The fixed instruction block for this tone.
    pub fn instructions(&self) -> &'static str {
        match self {
            Self::Conversational => CONVERSATIONAL,
            Self::Concise => CONCISE,
            Self::Detailed => DETAILED,
            Self::Professional => PROFESSIONAL,
            Self::Simple => SIMPLE,
        }
    }

    /// All tones, for iteration in validation and tests.
    pub fn all() -> [Tone; 5] {
        [
            Self::Conversational,
            Self::Concise,
            Self::Detailed,
            Self::Professional,
            Self::Simple,
        ]
    }
}
