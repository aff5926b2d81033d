// Session state, the bounded audio sink, and wire-format shapes.

use stt_gateway::protocol::{ControlMessage, ServerEvent};
use stt_gateway::session::{AudioMessage, Session};

#[test]
fn control_messages_parse_as_a_closed_union() {
    assert_eq!(
        serde_json::from_str::<ControlMessage>(r#"{"type":"lang","language":"hi"}"#).unwrap(),
        ControlMessage::Lang {
            language: "hi".to_string()
        }
    );
    assert_eq!(
        serde_json::from_str::<ControlMessage>(r#"{"type":"stop"}"#).unwrap(),
        ControlMessage::Stop
    );

    // Anything outside the set is rejected, not guessed at.
    assert!(serde_json::from_str::<ControlMessage>("not json").is_err());
    assert!(serde_json::from_str::<ControlMessage>(r#"{"type":"reset"}"#).is_err());
    assert!(serde_json::from_str::<ControlMessage>(r#"{"language":"en"}"#).is_err());
}

#[test]
fn server_events_use_the_wire_field_names() {
    let event = ServerEvent::Session {
        session_id: "abc".to_string(),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "session");
    assert_eq!(json["sessionId"], "abc");

    let event = ServerEvent::LangAck {
        language: "en".to_string(),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "lang_ack");
    assert_eq!(json["language"], "en");

    let event = ServerEvent::Transcript {
        text: "hello".to_string(),
        is_partial: true,
        session_id: "abc".to_string(),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "transcript");
    assert_eq!(json["text"], "hello");
    assert_eq!(json["isPartial"], true);
    assert_eq!(json["sessionId"], "abc");
}

#[tokio::test]
async fn frames_are_queued_in_arrival_order() {
    let (session, mut audio_rx) = Session::new("s1".to_string(), 8);

    session.push_chunk(vec![1]);
    session.push_chunk(vec![2]);
    session.push_end();

    assert_eq!(audio_rx.recv().await, Some(AudioMessage::Chunk(vec![1])));
    assert_eq!(audio_rx.recv().await, Some(AudioMessage::Chunk(vec![2])));
    assert_eq!(audio_rx.recv().await, Some(AudioMessage::End));

    assert_eq!(session.chunks_received(), 2);
    assert_eq!(session.bytes_received(), 2);
}

#[tokio::test]
async fn overflowing_frames_are_dropped_not_blocking() {
    let (session, mut audio_rx) = Session::new("s1".to_string(), 2);

    session.push_chunk(vec![1]);
    session.push_chunk(vec![2]);
    session.push_chunk(vec![3]); // queue full: dropped with a warning

    assert_eq!(audio_rx.recv().await, Some(AudioMessage::Chunk(vec![1])));
    assert_eq!(audio_rx.recv().await, Some(AudioMessage::Chunk(vec![2])));
    assert!(audio_rx.try_recv().is_err());

    // The counters still track arrival, the queue just shed the overflow.
    assert_eq!(session.chunks_received(), 3);
}

#[test]
fn closed_flag_is_set_exactly_once() {
    let (session, _audio_rx) = Session::new("s1".to_string(), 8);

    assert!(!session.is_closed());
    assert!(session.mark_closed());
    assert!(!session.mark_closed());
    assert!(session.is_closed());
}

#[test]
fn pending_language_takes_the_latest_selection() {
    let (session, _audio_rx) = Session::new("s1".to_string(), 8);

    assert_eq!(session.pending_language(), None);
    session.set_pending_language("en".to_string());
    session.set_pending_language("hi".to_string());
    assert_eq!(session.pending_language(), Some("hi".to_string()));

    let stats = session.stats();
    assert_eq!(stats.session_id, "s1");
    assert_eq!(stats.language, Some("hi".to_string()));
    assert_eq!(stats.chunks_received, 0);
}
