use crate::proto::ChallengeCode;

pub struct UpPrompt {
    pub title: String,
    pub description: String,
}

pub fn challenge_prompt(operation: &str, slot: u8, code: &ChallengeCode) -> UpPrompt {
    UpPrompt {
        title: "OnlyKey".to_string(),
        description: format!(
            "{operation} request sent to slot {slot}\n\n\
             Enter the 3 digit challenge code on the OnlyKey: {code}\n\n\
             Press ENTER here once the key has accepted it."
        ),
    }
}
