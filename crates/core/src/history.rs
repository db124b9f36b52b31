//! Short per-conversation memory. Only the last few exchanges are kept so a
//! follow-up like "what did I just ask?" can be answered without persistence.

use serde::{Deserialize, Serialize};

/// How many question/answer pairs are retained per conversation.
pub const RECENT_EXCHANGE_CAP: usize = 5;

/// Replies stored in history are truncated to keep memory bounded.
const STORED_REPLY_MAX_CHARS: usize = 400;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

/// Bounded FIFO of recent exchanges, newest last.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentExchanges {
    entries: Vec<Exchange>,
}

impl RecentExchanges {
    pub fn record(&mut self, question: &str, answer: &str) {
        let answer: String = answer.chars().take(STORED_REPLY_MAX_CHARS).collect();
        self.entries.push(Exchange { question: question.trim().to_string(), answer });
        if self.entries.len() > RECENT_EXCHANGE_CAP {
            let excess = self.entries.len() - RECENT_EXCHANGE_CAP;
            self.entries.drain(..excess);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest-first view for "recent questions" replies.
    pub fn newest_first(&self) -> impl Iterator<Item = &Exchange> {
        self.entries.iter().rev()
    }

    pub fn last(&self) -> Option<&Exchange> {
        self.entries.last()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{RecentExchanges, RECENT_EXCHANGE_CAP};

    #[test]
    fn history_is_capped_and_drops_the_oldest() {
        let mut history = RecentExchanges::default();
        for n in 0..8 {
            history.record(&format!("q{n}"), &format!("a{n}"));
        }
        let questions: Vec<&str> =
            history.newest_first().map(|exchange| exchange.question.as_str()).collect();
        assert_eq!(questions.len(), RECENT_EXCHANGE_CAP);
        assert_eq!(questions.first(), Some(&"q7"));
        assert_eq!(questions.last(), Some(&"q3"));
    }

    #[test]
    fn stored_replies_are_truncated() {
        let mut history = RecentExchanges::default();
        history.record("q", &"x".repeat(1000));
        assert_eq!(history.last().expect("entry").answer.chars().count(), 400);
    }
}
