//! Decoding of the spending transaction handed to the byte-level API.

use bitcoin::{consensus, Transaction};

use crate::Error;

/// A spending transaction decoded from wire bytes.
#[derive(Debug, Clone)]
pub struct TransactionContext {
    tx: Transaction,
}

impl TransactionContext {
    /// Decodes a transaction and requires the bytes to be exactly its canonical encoding.
    pub fn parse(tx_bytes: &[u8]) -> Result<Self, Error> {
        let (tx, consumed): (Transaction, usize) =
            consensus::deserialize_partial(tx_bytes).map_err(|_| Error::ERR_TX_DESERIALIZE)?;

        // Trailing bytes, or a non-canonical encoding of the same transaction.
        if consumed != tx_bytes.len() || consensus::serialize(&tx).len() != tx_bytes.len() {
            return Err(Error::ERR_TX_SIZE_MISMATCH);
        }

        Ok(Self { tx })
    }

    pub fn tx(&self) -> &Transaction {
        &self.tx
    }

    /// Ensures `input_index` points to an existing transaction input.
    pub fn ensure_input_index(&self, input_index: usize) -> Result<(), Error> {
        if input_index >= self.tx.input.len() {
            Err(Error::ERR_TX_INDEX)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::{
        absolute::LockTime, transaction::Version, Amount, OutPoint, ScriptBuf, Sequence, TxIn,
        TxOut, Witness,
    };

    fn sample() -> Transaction {
        Transaction {
            version: Version(1),
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::default(),
                script_sig: ScriptBuf::from_bytes(vec![0x51]),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(42),
                script_pubkey: ScriptBuf::new(),
            }],
        }
    }

    #[test]
    fn parses_canonical_bytes() {
        let tx = sample();
        let ctx = TransactionContext::parse(&consensus::serialize(&tx)).expect("valid tx");
        assert_eq!(ctx.tx().compute_txid(), tx.compute_txid());
        assert!(ctx.ensure_input_index(0).is_ok());
        assert_eq!(ctx.ensure_input_index(1), Err(Error::ERR_TX_INDEX));
    }

    #[test]
    fn rejects_trailing_and_truncated_bytes() {
        let mut bytes = consensus::serialize(&sample());
        bytes.push(0x00);
        assert_eq!(
            TransactionContext::parse(&bytes).unwrap_err(),
            Error::ERR_TX_SIZE_MISMATCH
        );

        bytes.truncate(bytes.len() - 3);
        assert_eq!(
            TransactionContext::parse(&bytes).unwrap_err(),
            Error::ERR_TX_DESERIALIZE
        );
        assert_eq!(
            TransactionContext::parse(&[]).unwrap_err(),
            Error::ERR_TX_DESERIALIZE
        );
    }
}
