// src/report/mod.rs

//! The portal's report catalog: which upstream codes select which table,
//! what that table should look like, and which years it is published for.

pub mod record;

pub use record::{HierarchicalRecord, ReportRecord, TradeRecord};

use std::{fmt, ops::RangeInclusive};

use crate::error::{Result, ScrapeError};
use crate::fetch::Query;

const PRODUCTION_CODE: &str = "opt_02";
const PROCESSING_CODE: &str = "opt_03";
const COMMERCIALIZATION_CODE: &str = "opt_04";
const IMPORT_CODE: &str = "opt_05";
const EXPORT_CODE: &str = "opt_06";

const CULTIVAR_HEADERS: &[&str] = &["Cultivar", "Quantidade (Kg)"];
const UNCLASSIFIED_HEADERS: &[&str] = &["Sem definição", "Quantidade (Kg)"];
const TRADE_HEADERS: &[&str] = &["Países", "Quantidade (Kg)", "Valor (US$)"];

const FIRST_YEAR: i32 = 1970;
const LAST_DOMESTIC_YEAR: i32 = 2023;
const LAST_TRADE_YEAR: i32 = 2024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Processing {
    Viniferas,
    AmericanHybrid,
    TableGrapes,
    Unclassified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportProduct {
    TableWine,
    Sparkling,
    FreshGrapes,
    Raisins,
    GrapeJuice,
}

/// Export has no raisins report; its fourth code is grape juice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportProduct {
    TableWine,
    Sparkling,
    FreshGrapes,
    GrapeJuice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Report {
    Production,
    Commercialization,
    Processing(Processing),
    Import(ImportProduct),
    Export(ExportProduct),
}

/// How the body rows of a report's table are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Item rows with nested subitem rows.
    TwoLevel,
    /// Item rows only.
    ItemsOnly,
    /// Country / quantity / value rows.
    Trade,
}

impl Report {
    pub const ALL: [Report; 15] = [
        Report::Production,
        Report::Commercialization,
        Report::Processing(Processing::Viniferas),
        Report::Processing(Processing::AmericanHybrid),
        Report::Processing(Processing::TableGrapes),
        Report::Processing(Processing::Unclassified),
        Report::Import(ImportProduct::TableWine),
        Report::Import(ImportProduct::Sparkling),
        Report::Import(ImportProduct::FreshGrapes),
        Report::Import(ImportProduct::Raisins),
        Report::Import(ImportProduct::GrapeJuice),
        Report::Export(ExportProduct::TableWine),
        Report::Export(ExportProduct::Sparkling),
        Report::Export(ExportProduct::FreshGrapes),
        Report::Export(ExportProduct::GrapeJuice),
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Report::Production => "producao",
            Report::Commercialization => "comercializacao",
            Report::Processing(p) => match p {
                Processing::Viniferas => "processamento/viniferas",
                Processing::AmericanHybrid => "processamento/americanas-hibridas",
                Processing::TableGrapes => "processamento/uvas-mesa",
                Processing::Unclassified => "processamento/sem-classificacao",
            },
            Report::Import(p) => match p {
                ImportProduct::TableWine => "importacao/vinho-mesa",
                ImportProduct::Sparkling => "importacao/espumante",
                ImportProduct::FreshGrapes => "importacao/uvas-frescas",
                ImportProduct::Raisins => "importacao/uvas-passas",
                ImportProduct::GrapeJuice => "importacao/suco-uva",
            },
            Report::Export(p) => match p {
                ExportProduct::TableWine => "exportacao/vinho-mesa",
                ExportProduct::Sparkling => "exportacao/espumante",
                ExportProduct::FreshGrapes => "exportacao/uvas-frescas",
                ExportProduct::GrapeJuice => "exportacao/suco-uva",
            },
        }
    }

    pub fn from_slug(slug: &str) -> Option<Report> {
        let slug = slug.trim().trim_matches('/');
        Report::ALL.into_iter().find(|r| r.slug() == slug)
    }

    /// Label placed in the output record's category / product field.
    pub fn label(self) -> &'static str {
        match self {
            Report::Production => "Produção",
            Report::Commercialization => "Comercialização",
            Report::Processing(p) => match p {
                Processing::Viniferas => "Viníferas",
                Processing::AmericanHybrid => "Americanas e híbridas",
                Processing::TableGrapes => "Uvas de mesa",
                Processing::Unclassified => "Sem classificação",
            },
            Report::Import(p) => match p {
                ImportProduct::TableWine => "Vinhos de mesa",
                ImportProduct::Sparkling => "Espumantes",
                ImportProduct::FreshGrapes => "Uvas frescas",
                ImportProduct::Raisins => "Uvas passas",
                ImportProduct::GrapeJuice => "Suco de uva",
            },
            Report::Export(p) => match p {
                ExportProduct::TableWine => "Vinhos de mesa",
                ExportProduct::Sparkling => "Espumantes",
                ExportProduct::FreshGrapes => "Uvas frescas",
                ExportProduct::GrapeJuice => "Suco de uva",
            },
        }
    }

    pub fn category_code(self) -> &'static str {
        match self {
            Report::Production => PRODUCTION_CODE,
            Report::Commercialization => COMMERCIALIZATION_CODE,
            Report::Processing(_) => PROCESSING_CODE,
            Report::Import(_) => IMPORT_CODE,
            Report::Export(_) => EXPORT_CODE,
        }
    }

    pub fn subcategory_code(self) -> Option<&'static str> {
        let code = match self {
            Report::Production | Report::Commercialization => return None,
            Report::Processing(p) => match p {
                Processing::Viniferas => "subopt_01",
                Processing::AmericanHybrid => "subopt_02",
                Processing::TableGrapes => "subopt_03",
                Processing::Unclassified => "subopt_04",
            },
            Report::Import(p) => match p {
                ImportProduct::TableWine => "subopt_01",
                ImportProduct::Sparkling => "subopt_02",
                ImportProduct::FreshGrapes => "subopt_03",
                ImportProduct::Raisins => "subopt_04",
                ImportProduct::GrapeJuice => "subopt_05",
            },
            Report::Export(p) => match p {
                ExportProduct::TableWine => "subopt_01",
                ExportProduct::Sparkling => "subopt_02",
                ExportProduct::FreshGrapes => "subopt_03",
                ExportProduct::GrapeJuice => "subopt_04",
            },
        };
        Some(code)
    }

    pub fn years(self) -> RangeInclusive<i32> {
        match self {
            Report::Import(_) | Report::Export(_) => FIRST_YEAR..=LAST_TRADE_YEAR,
            _ => FIRST_YEAR..=LAST_DOMESTIC_YEAR,
        }
    }

    pub fn check_year(self, year: i32) -> Result<()> {
        let years = self.years();
        if years.contains(&year) {
            Ok(())
        } else {
            Err(ScrapeError::InvalidYear {
                year,
                min: *years.start(),
                max: *years.end(),
            })
        }
    }

    pub fn query(self, year: i32) -> Query {
        Query {
            category: self.category_code(),
            subcategory: self.subcategory_code(),
            year,
        }
    }

    /// Header the table must carry, when the report has a fixed one.
    pub fn expected_headers(self) -> Option<&'static [&'static str]> {
        match self {
            Report::Production | Report::Commercialization => None,
            Report::Processing(Processing::Unclassified) => Some(UNCLASSIFIED_HEADERS),
            Report::Processing(_) => Some(CULTIVAR_HEADERS),
            Report::Import(_) | Report::Export(_) => Some(TRADE_HEADERS),
        }
    }

    pub fn layout(self) -> Layout {
        match self {
            Report::Processing(Processing::Unclassified) => Layout::ItemsOnly,
            Report::Import(_) | Report::Export(_) => Layout::Trade,
            _ => Layout::TwoLevel,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
