use std::sync::Arc;

use proptest::prelude::*;

use btc_primitives::chainhash::Hash;
use btc_primitives::Network;
use btc_script::{OpCodeBuilder, Script};
use btc_transaction::Transaction;

/// Push-only script; never shaped like a P2PKH or P2SH scriptPubKey.
fn arb_push_script() -> impl Strategy<Value = Script> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 1..40), 1..4).prop_map(|pushes| {
        let mut builder = OpCodeBuilder::new();
        for data in &pushes {
            builder = builder.push_data(data).unwrap();
        }
        builder.build()
    })
}

fn arb_input() -> impl Strategy<Value = ([u8; 32], u32, Script, u32, Vec<Vec<u8>>)> {
    (
        prop::array::uniform32(any::<u8>()),                  // prev tx hash
        any::<u32>(),                                         // prev tx index
        arb_push_script(),                                    // scriptSig
        any::<u32>(),                                         // sequence
        prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 1..3), // witness
    )
}

/// Strategy to generate a signable transaction with literal scriptSigs.
fn arb_transaction() -> impl Strategy<Value = Transaction> {
    let arb_output = (any::<u64>(), arb_push_script());

    (
        prop_oneof![Just(1u32), Just(2u32)],
        prop::collection::vec(arb_input(), 1..4),
        prop::collection::vec(arb_output, 1..4),
        any::<u32>(),
        any::<bool>(),
    )
        .prop_map(|(version, inputs, outputs, lock_time, segwit)| {
            let mut tx = Transaction::new(Arc::new(Network::mainnet()));
            tx.version = version;
            tx.lock_time = lock_time;
            tx.is_segwit = segwit;
            for (hash, index, script_sig, sequence, witness) in inputs {
                let input = tx.append_input(Hash::new(hash), index, None, None);
                input.set_script_sig(script_sig).set_sequence(sequence);
                if segwit {
                    for element in witness {
                        input.set_witness_data(element);
                    }
                }
            }
            for (value, script) in outputs {
                tx.append_output(script, value);
            }
            tx
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn signed_decode_sign_roundtrip(tx in arb_transaction()) {
        let signed = tx.sign().unwrap();
        let decoded = Transaction::decode(signed.bytes(), Arc::new(Network::mainnet())).unwrap();
        prop_assert_eq!(decoded.is_segwit, tx.is_segwit);
        prop_assert_eq!(decoded.inputs().len(), tx.inputs().len());
        let resigned = decoded.sign().unwrap();
        prop_assert_eq!(resigned.bytes(), signed.bytes());
        prop_assert_eq!(resigned.txid(), signed.txid());
    }

    #[test]
    fn legacy_size_matches_serialization(tx in arb_transaction()) {
        let signed = tx.sign().unwrap();
        let size = signed.size().unwrap();
        if tx.is_segwit {
            prop_assert_eq!(size.weight, size.size);
            prop_assert_ne!(signed.txid(), signed.hash());
        } else {
            prop_assert_eq!(size.size, signed.bytes().len());
            prop_assert_eq!(size.weight, size.size * 4);
            prop_assert_eq!(signed.txid(), signed.hash());
        }
    }

    #[test]
    fn truncated_transaction_fails(tx in arb_transaction(), cut in any::<prop::sample::Index>()) {
        let signed = tx.sign().unwrap();
        let bytes = signed.bytes();
        let len = cut.index(bytes.len());
        prop_assert!(Transaction::decode(&bytes[..len], Arc::new(Network::mainnet())).is_err());
    }

    #[test]
    fn decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = Transaction::decode(&bytes, Arc::new(Network::mainnet()));
    }
}
