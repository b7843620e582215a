//! Transaction orchestration.
//!
//! The builder takes in UTXOs, constructs outputs, applies change and
//! fee policy, and runs the multi-key signing loop: every input that a
//! key can satisfy gets a digest computed, Schnorr-signed, and packaged
//! into its satisfier script.

use nexa_primitives::{DigestOrder, Hash, PrivateKey, PublicKey};
use nexa_script::{Address, Script};

use crate::input::Input;
use crate::output::Output;
use crate::sighash::{signature_digest, SighashType};
use crate::signature::TxSignature;
use crate::transaction::{SerializationChecks, Transaction};
use crate::TransactionError;

/// Out-of-band template data accompanying a generic script-template UTXO.
#[derive(Clone, Debug)]
pub struct TemplateData {
    /// The template script committed to by the output.
    pub template: Script,
    /// The constraint script, when the output commits to one.
    pub constraint: Option<Script>,
    /// The key the template gates on, when the single-key pattern
    /// applies.
    pub public_key: Option<PublicKey>,
}

/// An unspent output offered to the builder.
#[derive(Clone, Debug)]
pub struct Utxo {
    /// The outpoint hash identifying the output.
    pub outpoint: Hash,
    /// The output's satoshi value.
    pub amount: u64,
    /// The output's locking script.
    pub script: Script,
    /// Template data for generic script-template outputs.
    pub template_data: Option<TemplateData>,
}

/// Builds and signs transactions.
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    tx: Transaction,
}

impl TransactionBuilder {
    /// Create a builder around an empty transaction.
    ///
    /// # Returns
    /// A new `TransactionBuilder`.
    pub fn new() -> Self {
        TransactionBuilder {
            tx: Transaction::new(),
        }
    }

    /// Spend a UTXO.
    ///
    /// The input variant is chosen by classifying the UTXO's locking
    /// script; generic script-template outputs use the accompanying
    /// template data (validated against the committed hashes).
    ///
    /// # Arguments
    /// * `utxo` - The unspent output to spend.
    ///
    /// # Returns
    /// `Ok(&mut Self)` for chaining, or an error for unrecognized
    /// scripts or mismatched template data.
    pub fn from_utxo(&mut self, utxo: Utxo) -> Result<&mut Self, TransactionError> {
        let output = Output::new(utxo.amount, utxo.script);
        let input = match utxo.template_data {
            Some(data) => Input::script_template(
                utxo.outpoint,
                utxo.amount,
                output,
                data.template,
                data.constraint,
                data.public_key,
            )?,
            None => Input::from_output(utxo.outpoint, utxo.amount, output)?,
        };
        self.tx.add_input(input);
        Ok(self)
    }

    /// Send an amount to an address.
    ///
    /// # Arguments
    /// * `address` - The destination address.
    /// * `amount` - The satoshi value.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn to_address(&mut self, address: &Address, amount: u64) -> &mut Self {
        self.tx.add_output(Output::new(amount, address.to_script()));
        self
    }

    /// Send an amount to a raw locking script.
    ///
    /// # Arguments
    /// * `script` - The destination locking script.
    /// * `amount` - The satoshi value.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn to_script(&mut self, script: Script, amount: u64) -> &mut Self {
        self.tx.add_output(Output::new(amount, script));
        self
    }

    /// Add a zero-value data-carrier output.
    ///
    /// # Arguments
    /// * `parts` - The payloads pushed after the OP_RETURN marker.
    ///
    /// # Returns
    /// `Ok(&mut Self)` for chaining, or an error when the carrier
    /// exceeds its size cap.
    pub fn add_data(&mut self, parts: &[&[u8]]) -> Result<&mut Self, TransactionError> {
        let script = nexa_script::builder::data_out(parts)?;
        self.tx.add_output(Output::new(0, script));
        Ok(self)
    }

    /// Send change to an address.
    ///
    /// # Arguments
    /// * `address` - The change address.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn change_to_address(&mut self, address: &Address) -> &mut Self {
        self.tx.set_change_script(address.to_script());
        self
    }

    /// Send change to a raw locking script.
    ///
    /// # Arguments
    /// * `script` - The change locking script.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn change_to_script(&mut self, script: Script) -> &mut Self {
        self.tx.set_change_script(script);
        self
    }

    /// Pin an explicit fee.
    ///
    /// # Arguments
    /// * `fee` - The fee in satoshis.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn fee(&mut self, fee: u64) -> &mut Self {
        self.tx.set_fee(fee);
        self
    }

    /// Pin a fee rate.
    ///
    /// # Arguments
    /// * `fee_per_byte` - The fee rate in satoshis per byte.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn fee_per_byte(&mut self, fee_per_byte: u64) -> &mut Self {
        self.tx.set_fee_per_byte(fee_per_byte);
        self
    }

    /// Set the lock time.
    ///
    /// # Arguments
    /// * `lock_time` - Block height or timestamp before which the
    ///   transaction is invalid.
    ///
    /// # Returns
    /// `&mut Self` for chaining.
    pub fn lock_time(&mut self, lock_time: u32) -> &mut Self {
        self.tx.lock_time = lock_time;
        self.tx.clear_signatures();
        self
    }

    /// Sign every input the key can satisfy.
    ///
    /// For each input whose `can_sign` accepts the key, computes the
    /// selective digest, Schnorr-signs it, and applies the resulting
    /// satisfier. Opaque inputs surface their state error.
    ///
    /// # Arguments
    /// * `private_key` - The signing key.
    /// * `sig_type` - The sighash type every produced signature commits
    ///   to.
    ///
    /// # Returns
    /// `Ok(&mut Self)` for chaining, or the first signing error.
    pub fn sign(
        &mut self,
        private_key: &PrivateKey,
        sig_type: SighashType,
    ) -> Result<&mut Self, TransactionError> {
        for index in 0..self.tx.inputs().len() {
            let input = &self.tx.inputs()[index];
            if !input.can_sign(private_key)? {
                continue;
            }
            let subscript = input.subscript()?;
            let digest = signature_digest(&self.tx, index, &sig_type, &subscript)?;
            let signature = private_key.sign_schnorr(&digest, DigestOrder::LittleEndian)?;
            let tx_signature = TxSignature::new(
                index as u32,
                private_key.public_key(),
                subscript,
                sig_type,
                signature,
            );
            self.tx.apply_signature(&tx_signature)?;
        }
        Ok(self)
    }

    /// Sign with several keys in sequence.
    ///
    /// # Arguments
    /// * `private_keys` - The signing keys.
    /// * `sig_type` - The sighash type every produced signature commits
    ///   to.
    ///
    /// # Returns
    /// `Ok(&mut Self)` for chaining, or the first signing error.
    pub fn sign_with_keys(
        &mut self,
        private_keys: &[PrivateKey],
        sig_type: SighashType,
    ) -> Result<&mut Self, TransactionError> {
        for key in private_keys {
            self.sign(key, sig_type)?;
        }
        Ok(self)
    }

    /// Borrow the transaction under construction.
    ///
    /// # Returns
    /// A reference to the transaction.
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// Run the serialization checks and return the finished transaction.
    ///
    /// # Arguments
    /// * `checks` - Which checks to run.
    ///
    /// # Returns
    /// The transaction, or the first check violation.
    pub fn build(self, checks: &SerializationChecks) -> Result<Transaction, TransactionError> {
        if let Some(err) = self.tx.get_serialization_error(checks) {
            return Err(err);
        }
        Ok(self.tx)
    }

    /// Return the transaction without running any checks.
    ///
    /// # Returns
    /// The transaction under construction.
    pub fn into_transaction(self) -> Transaction {
        self.tx
    }
}
