//! Conversation state for the multi-step chat flows: feedback, and the
//! administrators' router and tariff forms.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::db::{NewRouter, NewTariff};

/// Keeps the stored value of a field while editing
pub const SKIP_KEYWORD: &str = "пропустить";
/// Marks an absent optional tariff price
pub const NONE_KEYWORD: &str = "нет";
pub const MAX_NAME_LENGTH: usize = 255;

/// Which catalog table a flow operates on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogKind {
    Router,
    Tariff,
}

/// What to do with the record whose id is being requested
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordAction {
    Edit,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormMode {
    Add,
    Edit { id: i32 },
}

impl FormMode {
    pub fn allows_skip(&self) -> bool {
        matches!(self, FormMode::Edit { .. })
    }
}

/// Represents the conversation state of a chat
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum BotDialogueState {
    #[default]
    Start,
    WaitingForFeedback,
    RouterForm {
        mode: FormMode,
        field: RouterField,
        draft: RouterDraft,
    },
    TariffForm {
        mode: FormMode,
        field: TariffField,
        draft: TariffDraft,
    },
    WaitingForRecordId {
        kind: CatalogKind,
        action: RecordAction,
    },
    ConfirmDelete {
        kind: CatalogKind,
        id: i32,
    },
}

/// Type alias for our bot dialogue
pub type BotDialogue = Dialogue<BotDialogueState, InMemStorage<BotDialogueState>>;

/// Router fields in the order the form asks for them
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouterField {
    Name,
    Cost,
    Mesh,
    Gigabit,
    Band5Ghz,
    LanPorts,
}

impl RouterField {
    pub const FIRST: RouterField = RouterField::Name;

    pub fn next(self) -> Option<RouterField> {
        match self {
            RouterField::Name => Some(RouterField::Cost),
            RouterField::Cost => Some(RouterField::Mesh),
            RouterField::Mesh => Some(RouterField::Gigabit),
            RouterField::Gigabit => Some(RouterField::Band5Ghz),
            RouterField::Band5Ghz => Some(RouterField::LanPorts),
            RouterField::LanPorts => None,
        }
    }

    /// Localization key of the question for this field
    pub fn prompt_key(self) -> &'static str {
        match self {
            RouterField::Name => "router-prompt-name",
            RouterField::Cost => "router-prompt-cost",
            RouterField::Mesh => "router-prompt-mesh",
            RouterField::Gigabit => "router-prompt-gigabit",
            RouterField::Band5Ghz => "router-prompt-5ghz",
            RouterField::LanPorts => "router-prompt-ports",
        }
    }

    /// Current draft value, shown while editing
    pub fn current_value(self, draft: &RouterDraft) -> String {
        match self {
            RouterField::Name => draft.model_name.clone(),
            RouterField::Cost => draft.cost.to_string(),
            RouterField::Mesh => yes_no(draft.mesh).to_string(),
            RouterField::Gigabit => yes_no(draft.gigabit).to_string(),
            RouterField::Band5Ghz => yes_no(draft.band_5ghz).to_string(),
            RouterField::LanPorts => draft.lan_ports.to_string(),
        }
    }

    /// Store `input` into the draft. The skip keyword keeps the value when `mode` allows it.
    pub fn apply(
        self,
        draft: &mut RouterDraft,
        input: &str,
        mode: FormMode,
    ) -> Result<(), &'static str> {
        if mode.allows_skip() && is_skip(input) {
            return Ok(());
        }
        match self {
            RouterField::Name => draft.model_name = validate_name(input)?,
            RouterField::Cost => draft.cost = parse_non_negative(input)?,
            RouterField::Mesh => draft.mesh = parse_yes_no(input)?,
            RouterField::Gigabit => draft.gigabit = parse_yes_no(input)?,
            RouterField::Band5Ghz => draft.band_5ghz = parse_yes_no(input)?,
            RouterField::LanPorts => draft.lan_ports = parse_non_negative(input)?,
        }
        Ok(())
    }
}

/// Tariff fields in the order the form asks for them
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TariffField {
    Name,
    MonthlyCost,
    Cost6Months,
    Cost12Months,
    Promotion,
}

impl TariffField {
    pub const FIRST: TariffField = TariffField::Name;

    pub fn next(self) -> Option<TariffField> {
        match self {
            TariffField::Name => Some(TariffField::MonthlyCost),
            TariffField::MonthlyCost => Some(TariffField::Cost6Months),
            TariffField::Cost6Months => Some(TariffField::Cost12Months),
            TariffField::Cost12Months => Some(TariffField::Promotion),
            TariffField::Promotion => None,
        }
    }

    pub fn prompt_key(self) -> &'static str {
        match self {
            TariffField::Name => "tariff-prompt-name",
            TariffField::MonthlyCost => "tariff-prompt-monthly",
            TariffField::Cost6Months => "tariff-prompt-6-months",
            TariffField::Cost12Months => "tariff-prompt-12-months",
            TariffField::Promotion => "tariff-prompt-promotion",
        }
    }

    pub fn current_value(self, draft: &TariffDraft) -> String {
        match self {
            TariffField::Name => draft.name.clone(),
            TariffField::MonthlyCost => draft.monthly_cost.to_string(),
            TariffField::Cost6Months => optional_cost(draft.cost_6_months),
            TariffField::Cost12Months => optional_cost(draft.cost_12_months),
            TariffField::Promotion => yes_no(draft.promotion).to_string(),
        }
    }

    pub fn apply(
        self,
        draft: &mut TariffDraft,
        input: &str,
        mode: FormMode,
    ) -> Result<(), &'static str> {
        if mode.allows_skip() && is_skip(input) {
            return Ok(());
        }
        match self {
            TariffField::Name => draft.name = validate_name(input)?,
            TariffField::MonthlyCost => draft.monthly_cost = parse_non_negative(input)?,
            TariffField::Cost6Months => draft.cost_6_months = parse_optional_cost(input)?,
            TariffField::Cost12Months => draft.cost_12_months = parse_optional_cost(input)?,
            TariffField::Promotion => draft.promotion = parse_yes_no(input)?,
        }
        Ok(())
    }
}

/// Router values collected by the form
pub type RouterDraft = NewRouter;

/// Tariff values collected by the form
pub type TariffDraft = NewTariff;

pub fn yes_no(value: bool) -> &'static str {
    if value {
        "Да"
    } else {
        "Нет"
    }
}

fn optional_cost(value: Option<i32>) -> String {
    value.map_or_else(|| NONE_KEYWORD.to_string(), |cost| cost.to_string())
}

pub fn is_skip(input: &str) -> bool {
    input.trim().to_lowercase() == SKIP_KEYWORD
}

/// Validates a model or tariff name
pub fn validate_name(name: &str) -> Result<String, &'static str> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err("too_long");
    }

    Ok(trimmed.to_string())
}

/// Parses a price or a port count
pub fn parse_non_negative(input: &str) -> Result<i32, &'static str> {
    let value: i32 = input.trim().parse().map_err(|_| "not_a_number")?;
    if value < 0 {
        return Err("negative");
    }
    Ok(value)
}

/// Parses a price where "нет" means there is none
pub fn parse_optional_cost(input: &str) -> Result<Option<i32>, &'static str> {
    if input.trim().to_lowercase() == NONE_KEYWORD {
        return Ok(None);
    }
    parse_non_negative(input).map(Some).map_err(|_| "not_a_cost")
}

/// Accepts "Да"/"Нет" in any letter case
pub fn parse_yes_no(input: &str) -> Result<bool, &'static str> {
    match input.trim().to_lowercase().as_str() {
        "да" => Ok(true),
        "нет" => Ok(false),
        _ => Err("not_yes_no"),
    }
}

pub fn parse_record_id(input: &str) -> Result<i32, &'static str> {
    let id: i32 = input.trim().parse().map_err(|_| "not_an_id")?;
    if id <= 0 {
        return Err("not_an_id");
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_validation() {
        assert_eq!(validate_name("  TP-Link Archer C6  ").unwrap(), "TP-Link Archer C6");
        assert_eq!(validate_name("   "), Err("empty"));
        assert_eq!(validate_name(&"я".repeat(256)), Err("too_long"));
        assert!(validate_name(&"я".repeat(255)).is_ok());
    }

    #[test]
    fn test_yes_no_parsing() {
        assert_eq!(parse_yes_no("Да"), Ok(true));
        assert_eq!(parse_yes_no("НЕТ"), Ok(false));
        assert_eq!(parse_yes_no("может"), Err("not_yes_no"));
    }

    #[test]
    fn test_number_parsing() {
        assert_eq!(parse_non_negative(" 2500 "), Ok(2500));
        assert_eq!(parse_non_negative("-1"), Err("negative"));
        assert_eq!(parse_non_negative("дорого"), Err("not_a_number"));
        assert_eq!(parse_optional_cost("Нет"), Ok(None));
        assert_eq!(parse_optional_cost("5400"), Ok(Some(5400)));
        assert_eq!(parse_record_id("0"), Err("not_an_id"));
    }

    #[test]
    fn test_router_fields_cover_the_form_in_order() {
        let mut field = RouterField::FIRST;
        let mut count = 1;
        while let Some(next) = field.next() {
            field = next;
            count += 1;
        }
        assert_eq!(field, RouterField::LanPorts);
        assert_eq!(count, 6);
    }

    #[test]
    fn test_skip_only_when_editing() {
        let mut draft = RouterDraft {
            model_name: "Keenetic".to_string(),
            ..RouterDraft::default()
        };
        RouterField::Name
            .apply(&mut draft, "пропустить", FormMode::Edit { id: 1 })
            .unwrap();
        assert_eq!(draft.model_name, "Keenetic");

        RouterField::Name
            .apply(&mut draft, "пропустить", FormMode::Add)
            .unwrap();
        assert_eq!(draft.model_name, "пропустить");

        assert_eq!(
            RouterField::Cost.apply(&mut draft, "пропустить", FormMode::Add),
            Err("not_a_number")
        );
    }

    #[test]
    fn test_editing_a_stored_tariff() {
        let stored = crate::db::Tariff {
            id: 4,
            name: "Домашний 100".to_string(),
            monthly_cost: 650,
            cost_6_months: Some(3600),
            cost_12_months: None,
            promotion: false,
        };
        let mut draft = TariffDraft::from(stored.clone());
        let edit = FormMode::Edit { id: stored.id };

        TariffField::Name.apply(&mut draft, "пропустить", edit).unwrap();
        TariffField::MonthlyCost.apply(&mut draft, "700", edit).unwrap();
        TariffField::Cost6Months.apply(&mut draft, "нет", edit).unwrap();
        TariffField::Cost12Months.apply(&mut draft, "7000", edit).unwrap();
        TariffField::Promotion.apply(&mut draft, "да", edit).unwrap();

        let updated = draft.with_id(stored.id);
        assert_eq!(updated.name, "Домашний 100");
        assert_eq!(updated.monthly_cost, 700);
        assert_eq!(updated.cost_6_months, None);
        assert_eq!(updated.cost_12_months, Some(7000));
        assert!(updated.promotion);
    }
}
