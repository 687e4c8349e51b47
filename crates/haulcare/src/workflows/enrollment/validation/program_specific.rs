use super::{
    Checker, GetPreventativeScreeningsDraft, HealthyHabitsDraft, ProgramSpecificQuestionsDraft,
    RigsWithoutCigsDraft, VaccineVoucherDraft, ValidationErrors,
};
use crate::workflows::enrollment::domain::{
    GetPreventativeScreeningsAnswers, HealthyHabitsAndDiabetesPreventionAnswers,
    ProgramSelectionSection, ProgramSpecificQuestionsSection, RigsWithoutCigsAnswers,
    ScreeningKind, ServingsPerDay, TobaccoForm, VaccineKind, VaccineVoucherAnswers,
    WaterBottlesPerDay,
};
use crate::workflows::enrollment::programs::{required_subsections, QuestionSubsection};

/// Validate the blocks the current selection makes mandatory; drop the rest.
pub fn validate_program_specific_questions(
    draft: ProgramSpecificQuestionsDraft,
    selection: &ProgramSelectionSection,
) -> Result<ProgramSpecificQuestionsSection, ValidationErrors> {
    let required = required_subsections(selection);
    let mut errors = ValidationErrors::default();
    let mut section = ProgramSpecificQuestionsSection::default();

    for subsection in required {
        let field = subsection.field_name();
        match subsection {
            QuestionSubsection::HealthyHabitsAndDiabetesPrevention => {
                match draft.healthy_habits_and_diabetes_prevention.clone() {
                    Some(answers) => match validate_healthy_habits(answers, selection) {
                        Ok(valid) => section.healthy_habits_and_diabetes_prevention = Some(valid),
                        Err(found) => errors.extend(found),
                    },
                    None => errors.push(field.to_string(), "Required"),
                }
            }
            QuestionSubsection::RigsWithoutCigs => match draft.rigs_without_cigs.clone() {
                Some(answers) => match validate_rigs_without_cigs(answers) {
                    Ok(valid) => section.rigs_without_cigs = Some(valid),
                    Err(found) => errors.extend(found),
                },
                None => errors.push(field.to_string(), "Required"),
            },
            QuestionSubsection::VaccineVoucher => match draft.vaccine_voucher.clone() {
                Some(answers) => match validate_vaccine_voucher(answers) {
                    Ok(valid) => section.vaccine_voucher = Some(valid),
                    Err(found) => errors.extend(found),
                },
                None => errors.push(field.to_string(), "Required"),
            },
            QuestionSubsection::GetPreventativeScreenings => {
                match draft.get_preventative_screenings.clone() {
                    Some(answers) => match validate_preventative_screenings(answers) {
                        Ok(valid) => section.get_preventative_screenings = Some(valid),
                        Err(found) => errors.extend(found),
                    },
                    None => errors.push(field.to_string(), "Required"),
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(section)
    } else {
        Err(errors)
    }
}

fn validate_healthy_habits(
    draft: HealthyHabitsDraft,
    selection: &ProgramSelectionSection,
) -> Result<HealthyHabitsAndDiabetesPreventionAnswers, ValidationErrors> {
    let mut checker = Checker::nested("healthy_habits_and_diabetes_prevention");

    let weight_lbs = checker.positive("weight_lbs", draft.weight_lbs);
    let height_feet = checker.whole_in_range("height_feet", draft.height_feet, 1u8, 8u8);
    let height_inches = checker.whole_in_range("height_inches", draft.height_inches, 0u8, 11u8);
    let systolic_blood_pressure = checker.whole_in_range(
        "systolic_blood_pressure",
        draft.systolic_blood_pressure,
        1u16,
        400u16,
    );
    let diastolic_blood_pressure = checker.whole_in_range(
        "diastolic_blood_pressure",
        draft.diastolic_blood_pressure,
        1u16,
        400u16,
    );
    let has_had_glucose_or_a1c_test_in_past_year = checker.required(
        "has_had_glucose_or_a1c_test_in_past_year",
        draft.has_had_glucose_or_a1c_test_in_past_year,
    );
    let glucose_or_a1c_test_result =
        checker.text("glucose_or_a1c_test_result", draft.glucose_or_a1c_test_result);
    let movement_and_activity_ranking = checker.likert(
        "movement_and_activity_ranking",
        draft.movement_and_activity_ranking,
    );
    let energy_ranking = checker.likert("energy_ranking", draft.energy_ranking);
    let sleep_ranking = checker.likert("sleep_ranking", draft.sleep_ranking);
    let emotional_health_ranking =
        checker.likert("emotional_health_ranking", draft.emotional_health_ranking);
    let water_bottles_per_day = checker
        .text("water_bottles_per_day", draft.water_bottles_per_day)
        .and_then(|answer| {
            let parsed = WaterBottlesPerDay::from_answer(&answer);
            if parsed.is_none() {
                checker.fail("water_bottles_per_day", "Must be one of 1, 2, 3, 4 or 5+");
            }
            parsed
        });
    let fruit_and_vegetable_servings_per_day = checker
        .text(
            "fruit_and_vegetable_servings_per_day",
            draft.fruit_and_vegetable_servings_per_day,
        )
        .and_then(|answer| {
            let parsed = ServingsPerDay::from_answer(&answer);
            if parsed.is_none() {
                checker.fail(
                    "fruit_and_vegetable_servings_per_day",
                    "Must be a number from 0 to 9, or 10+",
                );
            }
            parsed
        });
    let other_illness_or_injury =
        checker.text("other_illness_or_injury", draft.other_illness_or_injury);
    let biggest_healthy_living_challenge = checker.text(
        "biggest_healthy_living_challenge",
        draft.biggest_healthy_living_challenge,
    );
    let short_term_health_goals =
        checker.text("short_term_health_goals", draft.short_term_health_goals);
    let long_term_health_goals =
        checker.text("long_term_health_goals", draft.long_term_health_goals);

    let devices = draft.devices;
    let owns_any_device = devices.has_scale
        || devices.has_blood_pressure_cuff
        || devices.has_glucose_monitor
        || devices.has_a1c_home_test
        || devices.has_fitness_tracker
        || devices.has_body_tape_measure
        || devices.has_resistance_bands
        || devices.has_other_exercise_equipment;
    if devices.none_of_the_above && owns_any_device {
        checker.fail(
            "devices",
            "'None of the above' cannot be combined with other devices",
        );
    }

    let healthy_habits_hopeful_learnings = if selection.opted_in_to_healthy_habits {
        checker.text(
            "healthy_habits_hopeful_learnings",
            draft.healthy_habits_hopeful_learnings,
        )
    } else {
        None
    };
    let diabetes_prevention_hopeful_learnings = if selection.opted_in_to_diabetes_prevention {
        checker.text(
            "diabetes_prevention_hopeful_learnings",
            draft.diabetes_prevention_hopeful_learnings,
        )
    } else {
        None
    };

    let answers = (|| {
        Some(HealthyHabitsAndDiabetesPreventionAnswers {
            weight_lbs: weight_lbs?,
            height_feet: height_feet?,
            height_inches: height_inches?,
            systolic_blood_pressure: systolic_blood_pressure?,
            diastolic_blood_pressure: diastolic_blood_pressure?,
            has_had_glucose_or_a1c_test_in_past_year: has_had_glucose_or_a1c_test_in_past_year?,
            glucose_or_a1c_test_result: glucose_or_a1c_test_result?,
            movement_and_activity_ranking: movement_and_activity_ranking?,
            energy_ranking: energy_ranking?,
            sleep_ranking: sleep_ranking?,
            emotional_health_ranking: emotional_health_ranking?,
            water_bottles_per_day: water_bottles_per_day?,
            fruit_and_vegetable_servings_per_day: fruit_and_vegetable_servings_per_day?,
            other_illness_or_injury: other_illness_or_injury?,
            biggest_healthy_living_challenge: biggest_healthy_living_challenge?,
            short_term_health_goals: short_term_health_goals?,
            long_term_health_goals: long_term_health_goals?,
            devices,
            healthy_habits_hopeful_learnings,
            diabetes_prevention_hopeful_learnings,
        })
    })();
    checker.finish(answers)
}

fn validate_rigs_without_cigs(
    draft: RigsWithoutCigsDraft,
) -> Result<RigsWithoutCigsAnswers, ValidationErrors> {
    let mut checker = Checker::nested("rigs_without_cigs");

    let tobacco_forms = checker.choices::<TobaccoForm>("tobacco_forms", draft.tobacco_forms);
    let tobacco_usage_length = checker.text("tobacco_usage_length", draft.tobacco_usage_length);
    let has_attempted_to_quit =
        checker.required("has_attempted_to_quit", draft.has_attempted_to_quit);
    let reason_for_quitting = checker.text("reason_for_quitting", draft.reason_for_quitting);
    let readiness_to_quit_ranking =
        checker.likert("readiness_to_quit_ranking", draft.readiness_to_quit_ranking);

    let answers = (|| {
        Some(RigsWithoutCigsAnswers {
            tobacco_forms: tobacco_forms?,
            tobacco_usage_length: tobacco_usage_length?,
            has_attempted_to_quit: has_attempted_to_quit?,
            reason_for_quitting: reason_for_quitting?,
            readiness_to_quit_ranking: readiness_to_quit_ranking?,
        })
    })();
    checker.finish(answers)
}

fn validate_vaccine_voucher(
    draft: VaccineVoucherDraft,
) -> Result<VaccineVoucherAnswers, ValidationErrors> {
    let mut checker = Checker::nested("vaccine_voucher");

    let vaccines = checker.choices::<VaccineKind>("vaccines", draft.vaccines);
    let wants_other = vaccines
        .as_ref()
        .is_some_and(|chosen| chosen.contains(&VaccineKind::Other));
    // Only kept when "other" is among the chosen vaccines.
    let other_vaccine = if wants_other {
        checker.text("other_vaccine", draft.other_vaccine)
    } else {
        None
    };
    let voucher_location = checker.text("voucher_location", draft.voucher_location);

    let answers = (|| {
        Some(VaccineVoucherAnswers {
            vaccines: vaccines?,
            other_vaccine,
            voucher_location: voucher_location?,
        })
    })();
    checker.finish(answers)
}

fn validate_preventative_screenings(
    draft: GetPreventativeScreeningsDraft,
) -> Result<GetPreventativeScreeningsAnswers, ValidationErrors> {
    let mut checker = Checker::nested("get_preventative_screenings");

    let requested_screenings =
        checker.choices::<ScreeningKind>("requested_screenings", draft.requested_screenings);
    let has_had_screening_in_past_year = checker.required(
        "has_had_screening_in_past_year",
        draft.has_had_screening_in_past_year,
    );

    let answers = (|| {
        Some(GetPreventativeScreeningsAnswers {
            requested_screenings: requested_screenings?,
            has_had_screening_in_past_year: has_had_screening_in_past_year?,
        })
    })();
    checker.finish(answers)
}
