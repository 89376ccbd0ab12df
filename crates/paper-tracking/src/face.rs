//! Face expression routing
//!
//! The face port carries one blendshape per address (`/jawOpen 0.5`). The
//! [`ExpressionTable`] binds each known address to one unified expression
//! channel and holds its latest weight; the [`ExpressionRouter`] applies the
//! per-address gain and writes the table into the host output each tick.

use paper_core::{UnifiedExpression, UnifiedTrackingData};
use paper_wire::OscMessage;

/// Face stream addresses and the channel each one drives
pub const EXPRESSION_ADDRESSES: &[(&str, UnifiedExpression)] = &[
    ("/cheekPuffLeft", UnifiedExpression::CheekPuffLeft),
    ("/cheekPuffRight", UnifiedExpression::CheekPuffRight),
    ("/cheekSquintLeft", UnifiedExpression::CheekSquintLeft),
    ("/cheekSquintRight", UnifiedExpression::CheekSquintRight),
    ("/noseSneerLeft", UnifiedExpression::NoseSneerLeft),
    ("/noseSneerRight", UnifiedExpression::NoseSneerRight),
    ("/jawOpen", UnifiedExpression::JawOpen),
    ("/jawForward", UnifiedExpression::JawForward),
    ("/jawLeft", UnifiedExpression::JawLeft),
    ("/jawRight", UnifiedExpression::JawRight),
    ("/mouthFunnel", UnifiedExpression::LipFunnel),
    ("/mouthPucker", UnifiedExpression::LipPucker),
    ("/mouthLeft", UnifiedExpression::MouthLeft),
    ("/mouthRight", UnifiedExpression::MouthRight),
    ("/mouthRollUpper", UnifiedExpression::MouthRollUpper),
    ("/mouthRollLower", UnifiedExpression::MouthRollLower),
    ("/mouthShrugUpper", UnifiedExpression::MouthShrugUpper),
    ("/mouthShrugLower", UnifiedExpression::MouthShrugLower),
    ("/mouthClose", UnifiedExpression::MouthClosed),
    ("/mouthSmileLeft", UnifiedExpression::MouthSmileLeft),
    ("/mouthSmileRight", UnifiedExpression::MouthSmileRight),
    ("/mouthFrownLeft", UnifiedExpression::MouthFrownLeft),
    ("/mouthFrownRight", UnifiedExpression::MouthFrownRight),
    ("/mouthDimpleLeft", UnifiedExpression::MouthDimpleLeft),
    ("/mouthDimpleRight", UnifiedExpression::MouthDimpleRight),
    ("/mouthUpperUpLeft", UnifiedExpression::MouthUpperUpLeft),
    ("/mouthUpperUpRight", UnifiedExpression::MouthUpperUpRight),
    ("/mouthLowerDownLeft", UnifiedExpression::MouthLowerDownLeft),
    ("/mouthLowerDownRight", UnifiedExpression::MouthLowerDownRight),
    ("/mouthPressLeft", UnifiedExpression::MouthPressLeft),
    ("/mouthPressRight", UnifiedExpression::MouthPressRight),
    ("/mouthStretchLeft", UnifiedExpression::MouthStretchLeft),
    ("/mouthStretchRight", UnifiedExpression::MouthStretchRight),
    ("/tongueOut", UnifiedExpression::TongueOut),
    ("/tongueUp", UnifiedExpression::TongueUp),
    ("/tongueDown", UnifiedExpression::TongueDown),
    ("/tongueLeft", UnifiedExpression::TongueLeft),
    ("/tongueRight", UnifiedExpression::TongueRight),
];

/// Gain applied to an address before it is stored.
///
/// The tracker under-reports lip funnel/pucker and lateral mouth movement.
pub fn address_gain(address: &str) -> f32 {
    match address {
        "/mouthFunnel" | "/mouthPucker" => 4.0,
        "/mouthLeft" | "/mouthRight" => 2.0,
        _ => 1.0,
    }
}

/// Two-way address/channel table holding the latest weight per channel
#[derive(Debug, Clone)]
pub struct ExpressionTable {
    weights: [f32; UnifiedExpression::COUNT],
}

impl ExpressionTable {
    pub fn new() -> Self {
        ExpressionTable {
            weights: [0.0; UnifiedExpression::COUNT],
        }
    }

    /// Channel bound to an address
    pub fn channel_of(address: &str) -> Option<UnifiedExpression> {
        EXPRESSION_ADDRESSES
            .iter()
            .find(|(a, _)| *a == address)
            .map(|(_, e)| *e)
    }

    /// Address bound to a channel
    pub fn address_of(expression: UnifiedExpression) -> Option<&'static str> {
        EXPRESSION_ADDRESSES
            .iter()
            .find(|(_, e)| *e == expression)
            .map(|(a, _)| *a)
    }

    /// Store a weight by address; returns `false` for unknown addresses
    pub fn set_by_address(&mut self, address: &str, weight: f32) -> bool {
        match Self::channel_of(address) {
            Some(expression) => {
                self.weights[expression.index()] = weight;
                true
            }
            None => false,
        }
    }

    pub fn weight(&self, expression: UnifiedExpression) -> f32 {
        self.weights[expression.index()]
    }

    pub fn weight_by_address(&self, address: &str) -> Option<f32> {
        Self::channel_of(address).map(|e| self.weight(e))
    }

    /// Every bound channel with its current weight
    pub fn iter(&self) -> impl Iterator<Item = (UnifiedExpression, f32)> + '_ {
        EXPRESSION_ADDRESSES
            .iter()
            .map(move |(_, e)| (*e, self.weights[e.index()]))
    }

    /// Zero every weight
    pub fn clear(&mut self) {
        self.weights = [0.0; UnifiedExpression::COUNT];
    }
}

impl Default for ExpressionTable {
    fn default() -> Self {
        ExpressionTable::new()
    }
}

/// Routes face messages into an owned [`ExpressionTable`]
#[derive(Debug, Clone, Default)]
pub struct ExpressionRouter {
    table: ExpressionTable,
}

impl ExpressionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &ExpressionTable {
        &self.table
    }

    /// Store a float message; returns whether a channel was updated
    pub fn process_message(&mut self, message: &OscMessage) -> bool {
        if !message.success {
            return false;
        }
        let Some(value) = message.value.as_float() else {
            return false;
        };

        let weight = value * address_gain(&message.address);
        let stored = self.table.set_by_address(&message.address, weight);
        if !stored {
            tracing::trace!("Ignoring face address {}", message.address);
        }
        stored
    }

    /// Per-tick pull: copy every bound channel into the host output
    pub fn update_expression_data(&self, output: &mut UnifiedTrackingData) {
        for (expression, weight) in self.table.iter() {
            output.set_weight(expression, weight);
        }
    }

    /// Forget every stored weight
    pub fn reset(&mut self) {
        self.table.clear();
    }
}
