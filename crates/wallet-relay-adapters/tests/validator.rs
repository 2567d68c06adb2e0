mod common;

use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;

use wallet_relay_core::contracts::message_to_transaction;
use wallet_relay_core::{MessageValidator, RelayError};

use common::{
    funded_chain, proxy_code_hash, sign_message, unsigned_message, wallet_address, whitelist,
    MockChain,
};

#[test]
fn a_well_funded_whitelisted_wallet_passes() {
    let wallet = wallet_address();
    let signer = PrivateKeySigner::random();
    let chain = funded_chain(wallet, 1, &[signer.address()]);
    let validator = MessageValidator::new(whitelist());

    let message = sign_message(&unsigned_message(wallet), &signer);
    let transaction = message_to_transaction(&message);
    validator
        .validate(&message, &transaction, &chain)
        .expect("validation passes");
}

#[test]
fn unknown_bytecode_fails_before_any_balance_query() {
    let wallet = wallet_address();
    let signer = PrivateKeySigner::random();
    // No code hash scripted: the wallet is not a recognised proxy.
    let chain = MockChain::new();
    let validator = MessageValidator::new(whitelist());

    let message = sign_message(&unsigned_message(wallet), &signer);
    let transaction = message_to_transaction(&message);
    let err = validator
        .validate(&message, &transaction, &chain)
        .expect_err("unrecognised proxy");

    match err {
        RelayError::InvalidProxy {
            address, expected, ..
        } => {
            assert_eq!(address, wallet);
            assert_eq!(expected, vec![proxy_code_hash()]);
        }
        other => panic!("expected InvalidProxy, got {other:?}"),
    }

    // The untrusted contract was never asked anything else.
    assert_eq!(chain.calls(), vec!["code_hash"]);
}

#[test]
fn declared_gas_limit_below_the_estimate_fails() {
    let wallet = wallet_address();
    let signer = PrivateKeySigner::random();
    let chain = funded_chain(wallet, 1, &[signer.address()]);
    chain.set_estimate(U256::from(2_000_000u64));
    let validator = MessageValidator::new(whitelist());

    let message = sign_message(&unsigned_message(wallet), &signer);
    let transaction = message_to_transaction(&message);
    let err = validator
        .validate(&message, &transaction, &chain)
        .expect_err("gas limit too low");
    assert!(matches!(err, RelayError::NotEnoughGas { .. }));
}

#[test]
fn insufficient_native_balance_fails() {
    let wallet = wallet_address();
    let signer = PrivateKeySigner::random();
    let chain = funded_chain(wallet, 1, &[signer.address()]);
    // Cost is gasLimit * gasPrice + value; one wei short of it.
    chain.set_balance(wallet, U256::from(1u64));
    let validator = MessageValidator::new(whitelist());

    let message = sign_message(&unsigned_message(wallet), &signer);
    let transaction = message_to_transaction(&message);
    let err = validator
        .validate(&message, &transaction, &chain)
        .expect_err("wallet cannot cover the cost");
    assert!(matches!(err, RelayError::NotEnoughTokens { .. }));
}

#[test]
fn erc20_gas_token_checks_the_token_balance() {
    let wallet = wallet_address();
    let signer = PrivateKeySigner::random();
    let token: Address = "0x3000000000000000000000000000000000000003"
        .parse()
        .expect("valid token address");

    let chain = funded_chain(wallet, 1, &[signer.address()]);
    let validator = MessageValidator::new(whitelist());

    let mut unsigned = unsigned_message(wallet);
    unsigned.gas_token = token;

    // Empty token balance fails even though the native balance is ample.
    let message = sign_message(&unsigned, &signer);
    let transaction = message_to_transaction(&message);
    let err = validator
        .validate(&message, &transaction, &chain)
        .expect_err("no tokens");
    match err {
        RelayError::NotEnoughTokens {
            token: reported, ..
        } => assert_eq!(reported, token),
        other => panic!("expected NotEnoughTokens, got {other:?}"),
    }

    chain.set_token_balance(token, wallet, U256::from(2_000_000_000_000_000u64));
    validator
        .validate(&message, &transaction, &chain)
        .expect("token balance covers the cost");
}
