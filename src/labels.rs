use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::model::PaymentMethod;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ru,
    Tj,
}

impl Lang {
    pub fn code(self) -> &'static str {
        match self {
            Lang::Ru => "ru",
            Lang::Tj => "tj",
        }
    }

    pub fn parse(code: &str) -> Result<Self, SettingsError> {
        match code.trim() {
            "ru" => Ok(Lang::Ru),
            "tj" => Ok(Lang::Tj),
            other => Err(SettingsError::UnknownLang(other.to_string())),
        }
    }
}

/// User-facing strings. Reports and exports take every caption from here.
#[derive(Debug)]
pub struct Labels {
    pub app_title: &'static str,
    pub journal_title: &'static str,
    pub stock_title: &'static str,
    pub analysis_title: &'static str,
    pub debts_title: &'static str,
    pub kpi_income: &'static str,
    pub kpi_expense: &'static str,
    pub kpi_profit: &'static str,
    pub kind_buy: &'static str,
    pub kind_sell: &'static str,
    pub kind_processing: &'static str,
    pub kind_expense: &'static str,
    pub method_cash: &'static str,
    pub method_card: &'static str,
    pub method_debt: &'static str,
    pub supplier: &'static str,
    pub client: &'static str,
    pub material: &'static str,
    pub weight: &'static str,
    pub amount: &'static str,
    pub col_time: &'static str,
    pub col_date: &'static str,
    pub col_type: &'static str,
    pub col_details: &'static str,
    pub col_sum: &'static str,
    pub generated: &'static str,
    pub sales_by_material: &'static str,
    pub expenses_by_category: &'static str,
    pub salary: &'static str,
    pub stock_empty: &'static str,
    pub no_debts: &'static str,
    pub confirm_delete: &'static str,
    pub confirm_pay: &'static str,
    pub currency: &'static str,
    pub kg: &'static str,
    pub months: [&'static str; 12],
}

impl Labels {
    pub fn for_lang(lang: Lang) -> &'static Labels {
        match lang {
            Lang::Ru => &RU,
            Lang::Tj => &TJ,
        }
    }

    pub fn method_name(&self, method: PaymentMethod) -> &'static str {
        match method {
            PaymentMethod::Cash => self.method_cash,
            PaymentMethod::Card => self.method_card,
            PaymentMethod::Deferred => self.method_debt,
        }
    }

    /// Display name for an expense category, translating internal keys.
    pub fn category_name<'a>(&'a self, category: &'a str) -> &'a str {
        if category == crate::model::SALARY_CATEGORY {
            self.salary
        } else {
            category
        }
    }
}

static RU: Labels = Labels {
    app_title: "EcoRecycle PRO",
    journal_title: "Журнал операций",
    stock_title: "Остатки на складе",
    analysis_title: "Анализ за период",
    debts_title: "Долги клиентов",
    kpi_income: "Доход",
    kpi_expense: "Расход",
    kpi_profit: "Прибыль",
    kind_buy: "Покупка",
    kind_sell: "Продажа",
    kind_processing: "Переработка",
    kind_expense: "Расход",
    method_cash: "Наличные",
    method_card: "Карта",
    method_debt: "Долг",
    supplier: "Поставщик",
    client: "Клиент",
    material: "Материал",
    weight: "Вес (кг)",
    amount: "Сумма",
    col_time: "Время",
    col_date: "Дата",
    col_type: "Тип",
    col_details: "Детали",
    col_sum: "Сумма",
    generated: "Сформировано",
    sales_by_material: "Продажи по материалам",
    expenses_by_category: "Расходы по категориям",
    salary: "Зарплата",
    stock_empty: "Склад пуст",
    no_debts: "Долгов нет",
    confirm_delete: "Удалить запись?",
    confirm_pay: "Подтвердить погашение долга?",
    currency: "c.",
    kg: "кг",
    months: [
        "Январь",
        "Февраль",
        "Март",
        "Апрель",
        "Май",
        "Июнь",
        "Июль",
        "Август",
        "Сентябрь",
        "Октябрь",
        "Ноябрь",
        "Декабрь",
    ],
};

static TJ: Labels = Labels {
    app_title: "EcoRecycle PRO",
    journal_title: "Журнали амалиётҳо",
    stock_title: "Бақияи анбор",
    analysis_title: "Таҳлили давра",
    debts_title: "Қарзҳои мизоҷон",
    kpi_income: "Даромад",
    kpi_expense: "Хароҷот",
    kpi_profit: "Фоида",
    kind_buy: "Харид",
    kind_sell: "Фурӯш",
    kind_processing: "Коркард",
    kind_expense: "Хароҷот",
    method_cash: "Нақд",
    method_card: "Корт",
    method_debt: "Қарз",
    supplier: "Таъминкунанда",
    client: "Мизоҷ",
    material: "Мавод",
    weight: "Вазн (кг)",
    amount: "Маблағ",
    col_time: "Вақт",
    col_date: "Сана",
    col_type: "Намуд",
    col_details: "Тафсилот",
    col_sum: "Маблағ",
    generated: "Таҳия шуд",
    sales_by_material: "Фурӯш аз рӯи мавод",
    expenses_by_category: "Хароҷот аз рӯи категория",
    salary: "Музди меҳнат",
    stock_empty: "Анбор холӣ аст",
    no_debts: "Қарз нест",
    confirm_delete: "Сабтро нест кунем?",
    confirm_pay: "Пардохти қарзро тасдиқ мекунед?",
    currency: "c.",
    kg: "кг",
    months: [
        "Январ",
        "Феврал",
        "Март",
        "Апрел",
        "Май",
        "Июн",
        "Июл",
        "Август",
        "Сентябр",
        "Октябр",
        "Ноябр",
        "Декабр",
    ],
};
