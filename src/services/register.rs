//! Register: owns the catalog and the prestations selected for the next
//! transaction, and turns them into a submission.

use chrono::NaiveDate;

use crate::services::gateway::Gateway;
use crate::types::{
    CatalogEntry, DraftPrestation, Money, PaymentMethod, PrestaError, Result, Submission,
};

pub const MISSING_SELECTION: &str = "Veuillez d'abord sélectionner une prestation.";
pub const MISSING_PAYMENT_METHOD: &str = "Veuillez sélectionner un mode de règlement.";
pub const EMPTY_TRANSACTION: &str = "Veuillez ajouter au moins une prestation à la transaction.";

/// Controller state for composing a transaction
#[derive(Debug, Default)]
pub struct Register {
    catalog: Vec<CatalogEntry>,
    selected: Vec<DraftPrestation>,
}

impl Register {
    pub fn new(catalog: Vec<CatalogEntry>) -> Self {
        Self {
            catalog,
            selected: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// Replace the catalog; already selected drafts keep their prices
    pub fn set_catalog(&mut self, catalog: Vec<CatalogEntry>) {
        self.catalog = catalog;
    }

    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.catalog.iter().find(|e| e.name == name)
    }

    pub fn selected(&self) -> &[DraftPrestation] {
        &self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Total of the selected drafts
    pub fn total(&self) -> Money {
        self.selected.iter().map(|d| d.actual_earning).sum()
    }

    /// Add a draft for catalog entry `name`.
    ///
    /// A blank or unparseable `custom_earning` means the catalog price.
    pub fn add(
        &mut self,
        name: Option<&str>,
        payment_method: Option<PaymentMethod>,
        custom_earning: &str,
    ) -> Result<&DraftPrestation> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| PrestaError::Validation(MISSING_SELECTION.into()))?;
        let payment_method = payment_method
            .ok_or_else(|| PrestaError::Validation(MISSING_PAYMENT_METHOD.into()))?;
        let entry = self
            .find(name)
            .ok_or_else(|| PrestaError::Validation(format!("Prestation inconnue : {}", name)))?;

        let draft = DraftPrestation::from_catalog(entry, payment_method, Money::parse(custom_earning));
        tracing::debug!(name = %draft.name, method = %draft.payment_method, "prestation added");
        self.selected.push(draft);
        Ok(&self.selected[self.selected.len() - 1])
    }

    /// Remove the draft at `index`
    pub fn remove(&mut self, index: usize) -> Option<DraftPrestation> {
        (index < self.selected.len()).then(|| self.selected.remove(index))
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Validate the selection and build the body to submit
    pub fn build_submission(&self, date: NaiveDate, invoice_number: &str) -> Result<Submission> {
        if self.selected.is_empty() {
            return Err(PrestaError::Validation(EMPTY_TRANSACTION.into()));
        }
        Ok(Submission {
            date,
            invoice_number: invoice_number.trim().to_string(),
            prestations: self.selected.clone(),
            token: None,
        })
    }

    /// Submit the selection. The list is cleared only when the backend
    /// confirms; on any error it is left untouched for a retry.
    pub fn submit(
        &mut self,
        gateway: &dyn Gateway,
        token: Option<&str>,
        date: NaiveDate,
        invoice_number: &str,
    ) -> Result<Submission> {
        let submission = self.build_submission(date, invoice_number)?;
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(PrestaError::not_signed_in)?;

        gateway.submit_transaction(&submission, token)?;
        self.selected.clear();
        Ok(submission)
    }
}
