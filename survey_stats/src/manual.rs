/*!

This is the long-form manual for `survey_stats` and `scrumsurvey`.

## Inputs

The survey was collected with two online forms. Each form exports a spreadsheet
in which the first row holds the full text of every question and each following
row is one response. The following formats are supported:
* `xlsx` Excel spreadsheets (the first worksheet, unless a worksheet name is given)
* `csv` Comma Separated Values, with the questions in the first line

The cell types (text, numbers, dates) are kept as they are. Empty cells and cells
only containing whitespace are missing answers.

## The jobs

`scrumsurvey` runs one job at a time, or all of them with `scrumsurvey all` (the
default when no job is given):

* `merge` reads the two exports, appends a `source` column with a tag for each
  export, and writes the merged spreadsheet. All the rows of the first export
  precede the rows of the second one. All the other jobs read the merged file and
  fail if it is missing.
* `frequencies` writes a workbook with one sheet per topic bucket, a `Summary` sheet
  and an `All Frequencies` sheet.
* `report` writes the descriptive statistics in Markdown.
* `charts` draws the bar charts (PNG).
* `summary` prints the overview of the dataset and the checklist of the generated
  files.

## Topic buckets

A question belongs to a bucket when its text contains one of the keywords of the
bucket, ignoring case. A question may belong to several buckets, or to none: there
is no priority between the buckets. The default buckets are:

| Bucket | Keywords |
| --- | --- |
| Demographics | role, experience, team size, industry, country, age |
| AI Usage | which ai, how often, frequency |
| Benefits | benefit, helpful, advantage, positive |
| Risks/Challenges | risk, problem, challenge, negative, frustration |
| Scrum Activities | sprint, backlog, planning, retrospective, daily |

The timestamp column and the `source` column are never classified.

## Frequency tables

The percentages of a frequency table are computed either over all the rows
(`TotalRows`, the missing answers are then reported as `Missing/No answer`) or over
the rows with an answer (`ValidOnly`). The two are not interchangeable: the Markdown
report uses the former, the workbook and the charts the latter.

Answers are listed by decreasing count. Equal counts are listed in alphabetical
order. When a limit is given, the answers beyond the limit are summed up in a
single `Others` row.

## Ordinal scales

Answers on a known scale are listed in the order of the scale instead of the
counts:

* Frequency: Never, Rarely, Sometimes, Often, Always
* Level: Very Low, Low, Moderate, High, Very High
* Agreement: Strongly Disagree, Disagree, Neutral, Agree, Strongly Agree
* Helpfulness: Not at all helpful, Slightly helpful, Moderately helpful, Very helpful,
  Extremely helpful
* Yes / No / Maybe

The match is exact. Answers outside of the scale are listed after the categories of
the scale.

## Configuration

Without `--config`, all the paths are relative to the current directory:

```text
data/raw/Exploring the Use of AI Chat Assistants in Scrum (respostas).xlsx
data/raw/Exploring the Use of AI Chat Assistants in Scrum - Udemy (Responses).xlsx
data/processed/merged_survey_data.xlsx
data/processed/frequency_analysis.xlsx
outputs/descriptive_stats.md
outputs/plots/
```

A JSON configuration file may override any of them, as well as the buckets. Relative
paths in the configuration are relative to the directory of the configuration file.

```json
{
  "sources": [
    { "label": "Survey 1 (respostas)", "filePath": "raw/respostas.xlsx" },
    { "label": "Survey 2 (Udemy)", "filePath": "raw/udemy.csv" }
  ],
  "mergedFile": "processed/merged_survey_data.xlsx",
  "buckets": [
    { "name": "Demographics", "keywords": ["role", "experience"] }
  ],
  "chartTopN": 10
}
```

*/
