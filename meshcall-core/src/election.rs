use crate::model::ParticipantId;

/// Decides which side of a pair sends the first offer.
///
/// Identifiers are compared by UTF-16 code units so that a native client and a
/// browser client elect the same initiator for any pair of names.
pub fn is_initiator(local: &ParticipantId, remote: &ParticipantId) -> bool {
    local
        .as_str()
        .encode_utf16()
        .lt(remote.as_str().encode_utf16())
}
