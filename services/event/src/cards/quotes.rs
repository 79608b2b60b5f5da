use rand::Rng;

/// Bounded pool of card captions.
pub const CARD_QUOTES: &[&str] = &[
    "Code the future.",
    "Innovate beyond limits.",
    "Build. Break. Repeat.",
    "Think. Build. Lead.",
    "Dream big, code bigger.",
    "Hack today, lead tomorrow.",
    "Ship it, measure it, improve it.",
    "Make it work, make it right, make it fast.",
    "Every bug is a chance to learn something new.",
    "Great things never come from comfort zones.",
    "The best way to predict the future is to build it.",
    "Your idea could change the world.",
    "Build solutions, not just code.",
    "Commit to excellence, push to success.",
    "Transform ideas into reality.",
    "Keep learning, keep coding, keep winning.",
    "Innovation starts here.",
    "Create value, deliver impact.",
    "Persistence is the key to mastery.",
    "Code is poetry written in logic.",
];

/// A random caption from the pool.
pub fn random_quote() -> &'static str {
    let mut rng = rand::rng();
    CARD_QUOTES[rng.random_range(0..CARD_QUOTES.len())]
}

/// Deterministic pick, used when cards for one team should vary but stay
/// reproducible across re-renders.
pub fn quote_for(index: usize) -> &'static str {
    CARD_QUOTES[index % CARD_QUOTES.len()]
}
