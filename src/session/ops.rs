use std::time::Duration;

use super::Session;
use crate::error::{Error, Result};
use crate::proto::{
    derive_buttons, read_fixed, types::*, ChunkFraming, Message, MessageField, Payload, ProtoError,
};
use crate::slot::{parse_key_labels, parse_labels, Slot};
use crate::up::{challenge_prompt, Confirmer};

#[derive(Debug, Clone, Copy)]
enum Operation {
    Sign,
    Decrypt,
    PublicKey,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Sign => "Sign",
            Operation::Decrypt => "Decrypt",
            Operation::PublicKey => "Public key",
        }
    }

    fn read_failed(self, source: ProtoError) -> Error {
        match self {
            Operation::Sign => Error::SignatureReadFailed(source),
            Operation::Decrypt => Error::DecryptReadFailed(source),
            Operation::PublicKey => Error::PublicKeyReadFailed(source),
        }
    }
}

/// Big-endian timestamp with leading zero bytes dropped, never empty.
pub(crate) fn time_payload(unix_secs: u64) -> Vec<u8> {
    let bytes = unix_secs.to_be_bytes();
    let first = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}

impl Session {
    pub fn is_initialized(&mut self) -> Result<bool> {
        Ok(self.read_text()? == "INITIALIZED")
    }

    pub fn get_labels(&mut self) -> Result<Vec<Slot>> {
        self.send_message(Message::GetLabels, None, None, &[])?;
        std::thread::sleep(self.config.label_delay);
        let replies = self.read_replies(LABEL_REPLIES)?;
        Ok(parse_labels(replies.iter().map(Vec::as_slice)))
    }

    pub fn get_key_labels(&mut self) -> Result<Vec<Slot>> {
        self.send_message(Message::GetLabels, Some(KEY_LABELS_SLOT), None, &[])?;
        let replies = self.read_replies(KEY_LABEL_REPLIES)?;
        Ok(parse_key_labels(replies.iter().map(Vec::as_slice)))
    }

    fn read_replies(&mut self, count: usize) -> Result<Vec<Vec<u8>>> {
        (0..count)
            .map(|_| self.read_report(self.config.read_timeout))
            .collect()
    }

    /// Write one field of a credential slot. Returns the device's reply.
    pub fn set_slot(&mut self, slot: u8, field: MessageField, value: &Payload) -> Result<String> {
        tracing::info!(slot, field = %field, "setting slot field");
        self.send_message(Message::SetSlot, Some(slot), Some(field), value.as_bytes())?;
        self.read_text()
    }

    pub fn wipe_slot(&mut self, slot: u8) -> Result<Vec<String>> {
        tracing::info!(slot, "wiping slot");
        self.send_message(Message::WipeSlot, Some(slot), None, &[])?;
        (0..WIPE_REPLIES).map(|_| self.read_text()).collect()
    }

    pub fn set_time(&mut self, unix_secs: u64) -> Result<()> {
        tracing::debug!(unix_secs, "setting device time");
        self.send_message(Message::SetTime, None, None, &time_payload(unix_secs))
    }

    /// Load an ECC private key. Wire order is slot, then key type.
    pub fn set_ecc_key(&mut self, slot: u8, key_type: u8, key: &[u8]) -> Result<()> {
        let mut payload = Vec::with_capacity(2 + key.len());
        payload.extend_from_slice(&[slot, key_type]);
        payload.extend_from_slice(key);
        self.send_message(Message::SetPriv, None, None, &payload)
    }

    /// Load an RSA private key across as many reports as it needs.
    pub fn set_rsa_key(&mut self, slot: u8, key_type: u8, key: &[u8]) -> Result<usize> {
        self.send_large(Message::SetPriv, ChunkFraming::KeyHeader { slot, key_type }, key)
    }

    /// Ask the key to generate its Ed25519 backup key and return the 32
    /// private bytes it echoes back.
    pub fn generate_backup_key(&mut self) -> Result<Vec<u8>> {
        tracing::warn!("generating backup key; store the output offline and delete it from this host");
        self.set_ecc_key(BACKUP_KEY_SLOT, BACKUP_KEY_TYPE, &[0])?;
        std::thread::sleep(self.config.backup_key_delay);
        for _ in 0..2 {
            let report = self.read_report(Duration::from_millis(10))?;
            if report.len() >= 64 {
                return Ok(report[..32].to_vec());
            }
        }
        Err(Error::BackupKeyReadFailed)
    }

    pub fn sign(&mut self, slot: u8, payload: &[u8], confirmer: &mut dyn Confirmer) -> Result<Vec<u8>> {
        self.challenge_exchange(Operation::Sign, Message::SignChallenge, slot, payload, confirmer)
    }

    pub fn decrypt(&mut self, slot: u8, payload: &[u8], confirmer: &mut dyn Confirmer) -> Result<Vec<u8>> {
        self.challenge_exchange(Operation::Decrypt, Message::Decrypt, slot, payload, confirmer)
    }

    pub fn get_public_key(&mut self, slot: u8) -> Result<Vec<u8>> {
        self.settle()?;
        self.send_message(Message::GetPubKey, None, None, &[slot])?;
        self.read_response(Operation::PublicKey)
    }

    fn challenge_exchange(
        &mut self,
        op: Operation,
        message: Message,
        slot: u8,
        payload: &[u8],
        confirmer: &mut dyn Confirmer,
    ) -> Result<Vec<u8>> {
        self.settle()?;
        let code = derive_buttons(payload);
        tracing::info!(op = op.name(), slot, len = payload.len(), "sending payload");
        self.send_large(message, ChunkFraming::SlotAndSize { slot }, payload)?;

        let prompt = challenge_prompt(op.name(), slot, &code);
        let _proof = confirmer.confirm(&prompt, self.config.confirm_timeout)?;
        self.read_response(op)
    }

    fn read_response(&mut self, op: Operation) -> Result<Vec<u8>> {
        match read_fixed(self.handle.as_mut(), &self.config.response) {
            Ok(data) => {
                tracing::info!(op = op.name(), len = data.len(), "response received");
                Ok(data)
            }
            Err(e) => {
                tracing::warn!(op = op.name(), error = %e, "response read failed");
                Err(op.read_failed(e))
            }
        }
    }
}
