//! Restricting corporation totals to the selected school's grade span

use crate::models::{AcademicRecord, GradeSpan};
use crate::schema::cell::Cell;
use crate::schema::columns::{Band, ColumnKey, Measure, Subject, TESTED_GRADES, TOTAL, grade_category};

/// Subjects whose corporation totals are recomputed
pub const REWEIGHTED_SUBJECTS: [Subject; 2] = [Subject::Ela, Subject::Math];

/// Grade-span proficiency of one subject: `Σ(At + Above) / Σ Tested`
///
/// Only grades with numeric tested and band counts contribute. `None` when
/// no grade in the span contributes.
#[must_use]
pub fn span_proficiency(record: &AcademicRecord, subject: Subject, span: GradeSpan) -> Option<f64> {
    let mut proficient = 0.0;
    let mut tested = 0.0;
    for grade in TESTED_GRADES
        .iter()
        .filter(|g| span.contains(crate::models::Grade::Numbered(**g)))
    {
        let category = grade_category(*grade);
        let t = record.get(&ColumnKey::tested(category.as_str(), subject));
        let at = record.get(&ColumnKey::new(category.as_str(), subject, Measure::Proficiency(Band::At)));
        let above = record.get(&ColumnKey::new(
            category.as_str(),
            subject,
            Measure::Proficiency(Band::Above),
        ));
        if let (Some(t), Some(at), Some(above)) = (t.value(), at.value(), above.value()) {
            tested += t;
            proficient += at + above;
        }
    }
    (tested > 0.0).then(|| proficient / tested)
}

/// Replace the corporation's `Total|ELA` and `Total|Math` proficiency with
/// grade-span values and adopt the selected school's grade span
///
/// Ethnicity and subgroup columns are left untouched.
pub fn reweight_corporation(corp: &mut AcademicRecord, span: GradeSpan) {
    for subject in REWEIGHTED_SUBJECTS {
        let key = ColumnKey::proficient(TOTAL, subject);
        match span_proficiency(corp, subject, span) {
            Some(value) => corp.set(key, Cell::Value(value)),
            None => {
                log::debug!(
                    "Corporation {} has no {subject} grade data in {span}; total set missing",
                    corp.meta.id
                );
                corp.set(key, Cell::Missing);
            }
        }
    }
    corp.meta.low_grade = Some(span.low);
    corp.meta.high_grade = Some(span.high);
}
