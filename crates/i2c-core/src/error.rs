use thiserror::Error;

/// Malformed bus topology detected while binding or decoding.
///
/// These are elaboration mistakes, not bus conditions: a running bus reports
/// every recoverable failure as [`Response::Nack`](crate::Response::Nack).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum TopologyError {
    /// The same target socket was bound to an initiator twice.
    #[error("target '{target}' is already bound to initiator '{initiator}'")]
    DuplicateTarget {
        /// Initiator socket name.
        initiator: String,
        /// Target socket name.
        target: String,
    },
    /// Two targets bound to one initiator share an address.
    #[error(
        "targets '{first}' and '{second}' bound to initiator '{initiator}' share address {address}"
    )]
    DuplicateAddress {
        /// Initiator socket name.
        initiator: String,
        /// Conflicting address.
        address: u16,
        /// Target bound first.
        first: String,
        /// Target bound later.
        second: String,
    },
    /// Binding attempted on a stubbed initiator.
    #[error("initiator '{initiator}' is stubbed and cannot be bound")]
    StubBinding {
        /// Initiator socket name.
        initiator: String,
    },
}

#[cfg(test)]
mod tests {
    use super::TopologyError;

    #[test]
    fn messages_name_the_offending_sockets() {
        let duplicate = TopologyError::DuplicateAddress {
            initiator: "bench.i2c_out".to_owned(),
            address: 42,
            first: "bench.i2c_in".to_owned(),
            second: "bench.i2c_array_in[42]".to_owned(),
        };
        assert_eq!(
            duplicate.to_string(),
            "targets 'bench.i2c_in' and 'bench.i2c_array_in[42]' bound to initiator \
             'bench.i2c_out' share address 42"
        );

        let stubbed = TopologyError::StubBinding {
            initiator: "bench.i2c_array_out[5]".to_owned(),
        };
        assert_eq!(
            stubbed.to_string(),
            "initiator 'bench.i2c_array_out[5]' is stubbed and cannot be bound"
        );
    }
}
