// src/services/stage_fees.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::models::project::{ProjectStage, StageView};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Horas estimadas de uma etapa: fee / taxa média, apenas com ambos positivos.
/// Sem arredondamento; quem exibe decide as casas.
pub fn hours_from_fee(fee: Decimal, avg_rate: Option<Decimal>) -> Option<Decimal> {
    match avg_rate {
        Some(rate) if rate > Decimal::ZERO && fee > Decimal::ZERO => Some(fee / rate),
        _ => None,
    }
}

/// Dias desde a data da fatura (arredondado para cima), 0 sem fatura.
pub fn invoice_age_days(invoice_date: Option<NaiveDate>, now: DateTime<Utc>) -> i64 {
    let Some(date) = invoice_date else {
        return 0;
    };
    let invoiced_at = date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    let Some(invoiced_at) = invoiced_at else {
        return 0;
    };

    let elapsed = (now - invoiced_at).num_milliseconds().abs();
    (elapsed + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

pub fn stage_view(stage: ProjectStage, avg_rate: Option<Decimal>, now: DateTime<Utc>) -> StageView {
    StageView {
        hours: hours_from_fee(stage.fee, avg_rate),
        invoice_age_days: invoice_age_days(stage.invoice_date, now),
        stage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(v: &str) -> Decimal {
        v.parse().expect("decimal")
    }

    #[test]
    fn hours_need_positive_fee_and_rate() {
        assert_eq!(hours_from_fee(dec("12000.0"), Some(dec("150.0"))), Some(dec("80.0")));
        let hours = hours_from_fee(dec("1000.0"), Some(dec("300.0"))).expect("hours");
        assert_eq!(hours, dec("1000") / dec("300"));
        assert_eq!(hours.round_dp(2), dec("3.33"));
        assert!(hours > dec("3.333"));
        assert_eq!(hours_from_fee(dec("1000.0"), Some(Decimal::ZERO)), None);
        assert_eq!(hours_from_fee(Decimal::ZERO, Some(dec("150.0"))), None);
        assert_eq!(hours_from_fee(dec("1000.0"), None), None);
        assert_eq!(hours_from_fee(dec("-10.0"), Some(dec("150.0"))), None);
    }

    #[test]
    fn invoice_age_rounds_partial_days_up() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        assert_eq!(invoice_age_days(Some("2024-06-01".parse().unwrap()), now), 10);
        assert_eq!(invoice_age_days(Some("2024-06-10".parse().unwrap()), now), 1);
        assert_eq!(invoice_age_days(None, now), 0);

        let midnight = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        assert_eq!(invoice_age_days(Some("2024-06-10".parse().unwrap()), midnight), 0);
        assert_eq!(invoice_age_days(Some("2024-06-03".parse().unwrap()), midnight), 7);
    }

    #[test]
    fn future_invoice_dates_use_absolute_distance() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        assert_eq!(invoice_age_days(Some("2024-06-12".parse().unwrap()), now), 2);
    }
}
