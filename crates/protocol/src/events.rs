//! Native input events dispatched over the remote-debugging connection.

use serde::{Deserialize, Serialize};

/// Input domain command carried by a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputEventType {
	/// Mouse move/press/release/wheel.
	DispatchMouseEvent,
	/// Raw key down/up and char events.
	DispatchKeyEvent,
	/// Touch start/move/end.
	DispatchTouchEvent,
	/// Native drag-and-drop.
	DispatchDragEvent,
	/// Text insertion, bypassing key events.
	InsertText,
}

impl InputEventType {
	/// Fully qualified protocol method name for this event type.
	pub fn method(&self) -> &'static str {
		match self {
			InputEventType::DispatchMouseEvent => "Input.dispatchMouseEvent",
			InputEventType::DispatchKeyEvent => "Input.dispatchKeyEvent",
			InputEventType::DispatchTouchEvent => "Input.dispatchTouchEvent",
			InputEventType::DispatchDragEvent => "Input.dispatchDragEvent",
			InputEventType::InsertText => "Input.insertText",
		}
	}
}

/// One native input event, forwarded to the low-level client verbatim.
///
/// The orchestrator never interprets `options`; their shape is owned by the
/// remote-debugging protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
	/// Which input command to dispatch.
	pub event_type: InputEventType,
	/// Command parameters, passed through unchanged.
	pub options: serde_json::Value,
}

impl InputEvent {
	pub fn new(event_type: InputEventType, options: serde_json::Value) -> Self {
		Self { event_type, options }
	}
}

/// One element of an event sequence: either a timed pause or an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SequenceItem {
	/// Suspends sequence execution for `duration_ms` before continuing.
	#[serde(rename_all = "camelCase")]
	Delay { duration_ms: u64 },
	/// Dispatches one native input event.
	#[serde(rename_all = "camelCase")]
	Event { event: InputEvent },
}

impl SequenceItem {
	/// Timed pause of `duration_ms` milliseconds.
	pub fn delay(duration_ms: u64) -> Self {
		SequenceItem::Delay { duration_ms }
	}

	/// Dispatchable event item.
	pub fn event(event_type: InputEventType, options: serde_json::Value) -> Self {
		SequenceItem::Event {
			event: InputEvent::new(event_type, options),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn event_type_maps_to_protocol_method() {
		assert_eq!(InputEventType::DispatchMouseEvent.method(), "Input.dispatchMouseEvent");
		assert_eq!(InputEventType::InsertText.method(), "Input.insertText");
	}

	#[test]
	fn sequence_items_tag_by_kind() {
		let delay = serde_json::to_string(&SequenceItem::delay(50)).unwrap();
		assert!(delay.contains("\"kind\":\"delay\""));
		assert!(delay.contains("\"durationMs\":50"));

		let event = serde_json::to_string(&SequenceItem::event(
			InputEventType::DispatchMouseEvent,
			json!({ "type": "mousePressed", "x": 1, "y": 2 }),
		))
		.unwrap();
		assert!(event.contains("\"kind\":\"event\""));
		assert!(event.contains("mousePressed"));
	}
}
