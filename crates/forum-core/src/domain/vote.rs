use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a stored vote.
///
/// There is no neutral variant: "no vote" is the absence of a [`Vote`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum VoteValue {
    Upvote,
    Downvote,
}

impl VoteValue {
    /// Contribution of this vote to a post's points.
    pub fn delta(self) -> i32 {
        match self {
            VoteValue::Upvote => 1,
            VoteValue::Downvote => -1,
        }
    }

    pub fn as_i16(self) -> i16 {
        match self {
            VoteValue::Upvote => 1,
            VoteValue::Downvote => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("vote value must be 1 or -1, got {0}")]
pub struct InvalidVoteValue(pub i16);

impl TryFrom<i16> for VoteValue {
    type Error = InvalidVoteValue;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteValue::Upvote),
            -1 => Ok(VoteValue::Downvote),
            other => Err(InvalidVoteValue(other)),
        }
    }
}

impl From<VoteValue> for i16 {
    fn from(value: VoteValue) -> Self {
        value.as_i16()
    }
}

/// A user's vote on a post. Identity is the `(post_id, user_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub value: VoteValue,
}

impl Vote {
    pub fn new(post_id: Uuid, user_id: Uuid, value: VoteValue) -> Self {
        Self {
            post_id,
            user_id,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_value_from_wire() {
        assert_eq!(VoteValue::try_from(1), Ok(VoteValue::Upvote));
        assert_eq!(VoteValue::try_from(-1), Ok(VoteValue::Downvote));
        assert_eq!(VoteValue::try_from(0), Err(InvalidVoteValue(0)));
        assert_eq!(VoteValue::try_from(2), Err(InvalidVoteValue(2)));
    }

    #[test]
    fn test_vote_value_deltas_are_opposite() {
        assert_eq!(VoteValue::Upvote.delta() + VoteValue::Downvote.delta(), 0);
    }
}
