use anyhow::Result;

use isp_support_bot::dialogue::{
    parse_optional_cost, parse_record_id, validate_name, BotDialogueState, FormMode, RouterDraft,
    RouterField, TariffDraft, TariffField,
};

/// Integration test for catalog name validation
#[tokio::test]
async fn test_name_validation() -> Result<()> {
    assert_eq!(validate_name("  Keenetic Giga  "), Ok("Keenetic Giga".to_string()));

    assert_eq!(validate_name(""), Err("empty"));
    assert_eq!(validate_name("   "), Err("empty"));
    assert_eq!(validate_name(&"я".repeat(256)), Err("too_long"));
    assert!(validate_name(&"я".repeat(255)).is_ok());

    Ok(())
}

/// Walk the whole router form in add mode
#[tokio::test]
async fn test_router_form_collects_every_field() -> Result<()> {
    let answers = ["TP-Link Archer", "3500", "нет", "ДА", "да", "4"];
    let mut draft = RouterDraft::default();
    let mut field = Some(RouterField::FIRST);

    for answer in answers {
        let current = field.expect("form ended early");
        current.apply(&mut draft, answer, FormMode::Add).unwrap();
        field = current.next();
    }

    assert_eq!(field, None);
    assert_eq!(draft.model_name, "TP-Link Archer");
    assert_eq!(draft.cost, 3500);
    assert!(!draft.mesh);
    assert!(draft.gigabit);
    assert!(draft.band_5ghz);
    assert_eq!(draft.lan_ports, 4);

    Ok(())
}

/// The skip keyword keeps stored values only while editing
#[tokio::test]
async fn test_skip_keeps_value_in_edit_mode() -> Result<()> {
    let mut draft = TariffDraft {
        name: "Домашний".to_string(),
        monthly_cost: 650,
        cost_6_months: Some(3600),
        cost_12_months: None,
        promotion: false,
    };

    TariffField::MonthlyCost.apply(&mut draft, "пропустить", FormMode::Edit { id: 3 }).unwrap();
    assert_eq!(draft.monthly_cost, 650);

    assert_eq!(
        TariffField::MonthlyCost.apply(&mut draft, "пропустить", FormMode::Add),
        Err("not_a_number")
    );

    TariffField::Cost6Months.apply(&mut draft, "Нет", FormMode::Edit { id: 3 }).unwrap();
    assert_eq!(draft.cost_6_months, None);

    Ok(())
}

#[tokio::test]
async fn test_number_parsing_errors() -> Result<()> {
    assert_eq!(parse_optional_cost("-5"), Err("not_a_cost"));
    assert_eq!(parse_optional_cost("1200"), Ok(Some(1200)));
    assert_eq!(parse_record_id("0"), Err("not_an_id"));
    assert_eq!(parse_record_id("abc"), Err("not_an_id"));
    assert_eq!(parse_record_id(" 17 "), Ok(17));

    Ok(())
}

/// Test dialogue state transitions
#[tokio::test]
async fn test_dialogue_state_serialization() -> Result<()> {
    let state = BotDialogueState::RouterForm {
        mode: FormMode::Edit { id: 5 },
        field: RouterField::Cost,
        draft: RouterDraft {
            model_name: "Mercusys".to_string(),
            ..RouterDraft::default()
        },
    };

    let json = serde_json::to_string(&state)?;
    let restored: BotDialogueState = serde_json::from_str(&json)?;
    assert_eq!(restored, state);

    assert_eq!(BotDialogueState::default(), BotDialogueState::Start);

    Ok(())
}
