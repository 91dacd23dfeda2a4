//! Sample data shared by tests

use crate::backend::FakeBackend;
use carehub_backend::ENGINE_FUNCTION;
use carehub_core::assessment::{
    ActivityLevel, AlcoholUse, Gender, QuestionnaireAction, SmokingStatus,
};
use carehub_core::risk::{AssessmentResult, Package, PackageTier, RiskLevel, RiskSummary, TestItem};
use serde_json::{json, Value};

/// Basic tier: price 1000, final 800, two tests
pub fn sample_package() -> Package {
    Package {
        tier: PackageTier::Basic,
        name: "Heart Health Basic".to_string(),
        tests: vec![
            TestItem::new("lipid-profile", "Lipid Profile", 250.0),
            TestItem::new("hba1c", "HbA1c", 750.0),
        ],
        price: 1000.0,
        discount: 200.0,
        final_price: 800.0,
    }
}

pub fn sample_result() -> AssessmentResult {
    AssessmentResult {
        risk_summary: RiskSummary {
            cardiac: 75.0,
            metabolic: 50.0,
            liver: 20.0,
            hormonal: 10.0,
        },
        risk_level: RiskLevel::High,
        packages: vec![
            sample_package(),
            Package {
                tier: PackageTier::Advanced,
                name: "Heart Health Advanced".to_string(),
                tests: vec![
                    TestItem::new("lipid-profile", "Lipid Profile", 250.0),
                    TestItem::new("hba1c", "HbA1c", 750.0),
                    TestItem::new("ecg", "ECG", 1000.0),
                ],
                price: 2000.0,
                discount: 500.0,
                final_price: 1500.0,
            },
            Package {
                tier: PackageTier::Comprehensive,
                name: "Heart Health Premium".to_string(),
                tests: vec![TestItem::new("tmt", "Treadmill Test", 4000.0)],
                price: 4000.0,
                discount: 1000.0,
                final_price: 3000.0,
            },
        ],
    }
}

/// Engine reply in wire form
pub fn engine_reply() -> Value {
    serde_json::to_value(sample_result()).unwrap()
}

/// Actions that fill in every required questionnaire answer
pub fn complete_answers() -> Vec<QuestionnaireAction> {
    vec![
        QuestionnaireAction::SetAge("42".into()),
        QuestionnaireAction::SetGender(Gender::Male),
        QuestionnaireAction::SetWeight("80".into()),
        QuestionnaireAction::SetHeight("180".into()),
        QuestionnaireAction::SetSmoker(SmokingStatus::Former),
        QuestionnaireAction::SetAlcohol(AlcoholUse::Occasional),
        QuestionnaireAction::SetActivityLevel(ActivityLevel::Light),
        QuestionnaireAction::ToggleCondition("hypertension".into()),
        QuestionnaireAction::ToggleSymptom("fatigue".into()),
    ]
}

pub fn medicine_rows() -> Vec<Value> {
    vec![
        json!({"id": "m-1", "name": "Paracetamol 500", "brand": "Crocin", "category": "Pain relief", "price": 30.0, "mrp": 35.0}),
        json!({"id": "m-2", "name": "Vitamin D3 60K", "brand": "Uprise", "category": "Supplements", "price": 120.0, "mrp": 140.0}),
        json!({"id": "m-3", "name": "Amoxicillin 500", "brand": "Mox", "category": "Antibiotics", "price": 90.0, "mrp": 100.0,
               "is_prescription_required": true}),
    ]
}

pub fn doctor_rows() -> Vec<Value> {
    vec![
        json!({"id": "d-1", "name": "Dr. Asha Rao", "specialization": "Cardiology", "consultation_fee": 800.0, "city": "Pune"}),
        json!({"id": "d-2", "name": "Dr. Vikram Shah", "specialization": "Endocrinology", "consultation_fee": 700.0}),
    ]
}

pub fn lab_test_rows() -> Vec<Value> {
    vec![
        json!({"id": "l-1", "name": "Vitamin D (25-OH)", "category": "Vitamins", "price": 900.0, "mrp": 1200.0}),
        json!({"id": "l-2", "name": "Complete Blood Count", "category": "Haematology", "price": 300.0}),
    ]
}

pub fn service_rows() -> Vec<Value> {
    vec![
        json!({"id": "s-1", "name": "Nursing care (12h)", "category": "home_care", "price": 1500.0}),
        json!({"id": "s-2", "name": "Knee physiotherapy", "category": "physiotherapy", "price": 600.0}),
    ]
}

/// Backend seeded with catalog rows and a working engine
pub fn seeded_backend() -> FakeBackend {
    FakeBackend::new()
        .with_rows("medicines", medicine_rows())
        .with_rows("doctors", doctor_rows())
        .with_rows("lab_tests", lab_test_rows())
        .with_rows("service_catalog", service_rows())
        .with_function(ENGINE_FUNCTION, Ok(engine_reply()))
}
