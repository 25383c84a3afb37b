/// Built-in puzzle catalogue
///
/// Cohort A debugs Python, cohort B debugs C. Each set holds five puzzles with
/// two visible and three hidden cases; fragments are `FRAGMENT1`..`FRAGMENT5`.
/// A JSON catalogue named in the portal config replaces these sets entirely.
use crate::config::types::{Cohort, Language, Puzzle, TestCase};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Alternate accepted final answer when the config does not override it
pub const DEFAULT_OVERRIDE_PHRASE: &str = "UPSIDE DOWN";

/// Side-challenge vocabulary
pub fn default_word_list() -> Vec<String> {
    [
        "HAWKINS",
        "DEMOGORGON",
        "ELEVEN",
        "WAFFLES",
        "UPSIDE",
        "LABORATORY",
        "PORTAL",
        "WALKIE",
        "ARCADE",
        "MINDFLAYER",
        "LIGHTS",
        "BICYCLE",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
}

/// Finale guidance shown once the side challenge is solved, per cohort
pub fn default_finale_clues() -> BTreeMap<Cohort, Vec<String>> {
    let cohort_a = [
        "1. The quiet town hides a secret at its end. Take the last three letters of its name and reverse them. (letters all lowercase.)",
        "2. Count only the letters that are not vowels in the place where people collect ideas on boards. (The result is a digit.)",
        "3. The ruler of the Upside Down, who controls the mind, leaves a clue. Find letters 3-5, flip them backward, and write all three letters in uppercase.",
        "4. A lone number stands exactly as it is. Do not alter it.",
        "5. From the creature that lurks between the two worlds, whose name begins with dread, take its opening three-letter fragment and write it in ALL CAPS.",
        "6. The power that moves objects. Take the first and last letters and write both in uppercase.",
        "7. Finish with a sharp symbol: add #.",
    ];
    let cohort_b = [
        "1. A beast born from Hawkins Lab hides a faithful pet within its very name. Take that pet, change it to CAPS, flip it backwards, and replace every \"o\" in it with 0.",
        "2. When all lights go out, one word describes that world. From that word, take the last three letters and enter them backwards, all in lowercase.",
        "3. She is a well-known goddess of power and destruction in India. Use the first two letters of her name in ALL CAPS.",
        "4. The mind's silent force begins and ends boldly. Take the first and last letters of the word and write both in uppercase.",
        "5. A timeless proverb about friends. Count the number of words in it and use that number.",
        "6. The boy who changed Hawkins forever left behind a surname of five letters. Replace every vowel with ! and write the result in ALL CAPS.",
        "7. Every coded message needs its closure. End yours with the mark that glints like a sharpened hook: $.",
    ];

    BTreeMap::from([
        (Cohort::CohortA, cohort_a.iter().map(|c| c.to_string()).collect()),
        (Cohort::CohortB, cohort_b.iter().map(|c| c.to_string()).collect()),
    ])
}

fn cases(pairs: &[(&str, &str)]) -> Vec<TestCase> {
    pairs
        .iter()
        .map(|(input, expected)| TestCase::new(*input, *expected))
        .collect()
}

fn puzzle(
    index: usize,
    cohort: Cohort,
    language: Language,
    buggy_source: &str,
    hint: &str,
    visible: &[(&str, &str)],
    hidden: &[(&str, &str)],
) -> Puzzle {
    Puzzle {
        index,
        cohort,
        language,
        buggy_source: buggy_source.to_string(),
        hint: hint.to_string(),
        fragment: format!("FRAGMENT{}", index + 1),
        visible: cases(visible),
        hidden: cases(hidden),
    }
}

fn python_set() -> Vec<Puzzle> {
    let c = Cohort::CohortA;
    let py = Language::Python;
    vec![
        puzzle(
            0,
            c,
            py,
            r#"def count_vowels(text)
    vowels = "aeiouAEIOU"
    count = 0
    vowel_list = []

    for ch in txt:
    if ch in vowels
        count = count + 1
        vowel_list.append(ch)

    result =
        "input_string": text,
        "total_vowels": count,
        "vowels_found": vowel_list
    }

    return results

user_text = input()
output = count_vowel(user_text)
print("Vowel Count =", output["total_vowel"])"#,
            "Fix function name, indentation, variables, and dictionary syntax",
            &[("apple", "Vowel Count = 2"), ("HELLO", "Vowel Count = 2")],
            &[
                ("python", "Vowel Count = 1"),
                ("computer", "Vowel Count = 3"),
                ("STRANGER THINGS", "Vowel Count = 3"),
            ],
        ),
        puzzle(
            1,
            c,
            py,
            r#"def reverse_string(text)
    reversed_text = ''

    idx = len(txt) - 1
    while idx > 0:
        reversed_text += text[idx]
        idx -= 1

    result =
        "original": text,
        "reversed": reversed_text
    }
    return reslts

user_input = input()
out = reverseStr(user_input)
print(out["reversed"])"#,
            "Fix variable names, index range, missing braces, and return",
            &[("hello", "olleh"), ("A", "A")],
            &[
                ("12345", "54321"),
                ("Python Program", "margorP nohtyP"),
                ("racecar", "racecar"),
            ],
        ),
        puzzle(
            2,
            c,
            py,
            r#"def digit_sum(num)
    total = 0
    temp = n

    while temp >= 0:
        digit = temp % 10
        total =+ digit
        temp = temp / 10

    result =
        "number": num,
        "sum_of_digits": total

    return res

number = int(input())
output = digit_sum(number)
print("Sum =", output["sum_of_digits"])"#,
            "Fix temp variable, loop condition, += operator, dict syntax",
            &[("123", "Sum = 6"), ("789", "Sum = 24")],
            &[("5", "Sum = 5"), ("1005", "Sum = 6"), ("2024", "Sum = 8")],
        ),
        puzzle(
            3,
            c,
            py,
            r#"def count_words(sentence)
    words = sent.split()
    total = len(word)
    result =
        "sentence": sentence,
        "word_count": total,
        "words": words
    }
    return results

s = input()
output = countwords(s)
print(output['word_count'])"#,
            "Fix wrong variable names, dict syntax, function name",
            &[("hello world", "2"), ("Python is amazing", "3")],
            &[
                ("I", "1"),
                ("ChatGPT helps me learn programming", "5"),
                ("Welcome to PSG Tech", "4"),
            ],
        ),
        puzzle(
            4,
            c,
            py,
            r#"def find_largest(numbers)
    largest = numbers

    for n in number:
        if n < largest:
            largest = n

    result =
        "numbers": numbers,
        "largest": largest
    }

    return lasts

text = input()
num_list = [int(x) for x in text.split()]
output = find_largest(num_list)
print(output["largest"])"#,
            "Fix list indexing, loop variable, comparison direction",
            &[("5 10 2 8", "10"), ("-5 -1 -7 -3", "-1")],
            &[("100", "100"), ("15 22 1 22 9", "22"), ("3 3 3 3", "3")],
        ),
    ]
}

fn c_set() -> Vec<Puzzle> {
    let b = Cohort::CohortB;
    let lang = Language::C;
    vec![
        puzzle(
            0,
            b,
            lang,
            r#"#include <stdio.h>
#include <stdlib.h>

int recursiveBS(int arr[], int low, int high, int target) {
    if (low > high) {
        return 0;
    }
    int mid = (low + high) / 2;

    if (arr[mid] == target) {
        return mid;
    }

    if (arr[mid] < target) {
        return recursiveBS(arr, mid + 1, high, target);
    } else {
        return recursiveBS(arr, low, mid, target);
    }
}

int main() {
    int n, target;
    scanf("%d", &n);
    int *arr = malloc(n * sizeof(int));
    for (int i = 0; i < n; i++) {
        scanf("%d", &arr[i]);
    }
    scanf("%d", &target);
    printf("%d\n", recursiveBS(arr, 0, n - 1, target));
    free(arr);
    return 0;
}"#,
            "Base case & mid recursion step are incorrect.",
            &[
                ("5\n10 20 30 40 50\n30\n", "2"),
                ("5\n10 20 30 40 50\n10\n", "0"),
            ],
            &[
                ("5\n10 20 30 40 50\n99\n", "-1"),
                ("7\n2 8 12 15 19 25 30\n19\n", "4"),
                ("7\n2 8 12 15 19 25 30\n5\n", "-1"),
            ],
        ),
        puzzle(
            1,
            b,
            lang,
            r#"#include <stdio.h>
#include <stdlib.h>

void swap(int *a, int *b) {
    int temp = *a;
    *a = *b;
}

void selectionSort(int arr[], int n) {
    int i, j, min_idx;
    for (i = 0; i < n - 1; i++) {
        min_idx = i;
        for (j = i + 1; j <= n; j++) {
            if (arr[j] < arr[min_idx]) {
                min_idx = j;
            }
        }
        swap(&arr[min_idx], &arr[i]);
    }
}

int main() {
    int n;
    scanf("%d", &n);
    int *arr = malloc(n * sizeof(int));
    for (int i = 0; i < n; i++) {
        scanf("%d", &arr[i]);
    }
    selectionSort(arr, n);
    for (int i = 0; i < n; i++) printf("%d ", arr[i]);
    printf("\n");
    free(arr);
    return 0;
}"#,
            "swap() incomplete & j loop goes out of bounds.",
            &[
                ("5\n5 4 3 2 1\n", "1 2 3 4 5 "),
                ("6\n64 25 12 22 11 90\n", "11 12 22 25 64 90 "),
            ],
            &[
                ("4\n1 2 3 4\n", "1 2 3 4 "),
                ("5\n4 1 4 2 1\n", "1 1 2 4 4 "),
                ("1\n42\n", "42 "),
            ],
        ),
        puzzle(
            2,
            b,
            lang,
            r#"#include <stdio.h>
#define MAX_SIZE 5

int stack_arr[MAX_SIZE];
int top = 0;

void push(int val) {
    if (top > MAX_SIZE) {
        return;
    }
    stack_arr[top] = val;
    top++;
}

int pop() {
    if (top == -1) {
        return -999;
    }
    return stack_arr[top--];
}

int main() {
    int num_push, num_pop, val;
    scanf("%d", &num_push);
    for (int i = 0; i < num_push; i++) {
        scanf("%d", &val);
        push(val);
    }
    scanf("%d", &num_pop);
    for (int i = 0; i < num_pop; i++) {
        printf("%d ", pop());
    }
    return 0;
}"#,
            "top condition wrong in push; pop checks wrong empty state.",
            &[("3\n10 20 30\n2\n", "30 20 "), ("1\n100\n1\n", "100 ")],
            &[
                ("2\n10 20\n3\n", "20 10 -999 "),
                ("6\n1 2 3 4 5 6\n2\n", "5 4 "),
                ("0\n\n1\n", "-999 "),
            ],
        ),
        puzzle(
            3,
            b,
            lang,
            r#"#include <stdio.h>
#include <stdlib.h>

struct Node { int data; struct Node *next; };

struct Node* insertAtEnd(struct Node* head, int data) {
    struct Node *newNode = malloc(sizeof(struct Node));
    newNode->data = data; newNode->next = NULL;
    if (head == NULL) return newNode;
    struct Node *temp = head;
    while (temp->next != NULL) temp = temp->next;
    temp->next = newNode;
    return head;
}

int findMiddle(struct Node *head) {
    struct Node *slow = head;
    struct Node *fast = head->next;

    while (fast != NULL) {
        slow++;
        fast = fast->next->next;
    }
    return slow->data;
}

int main() {
    struct Node *head = NULL;
    int n, val;
    scanf("%d", &n);
    for (int i = 0; i < n; i++) {
        scanf("%d", &val);
        head = insertAtEnd(head, val);
    }
    if (n == 0) {
        printf("-1\n");
    } else {
        printf("%d\n", findMiddle(head));
    }
    return 0;
}"#,
            "Incorrect pointer movement; slow++ is invalid.",
            &[("5\n1 2 3 4 5\n", "3"), ("4\n1 2 3 4\n", "3")],
            &[("1\n10\n", "10"), ("0\n", "-1"), ("2\n10 20\n", "20")],
        ),
        puzzle(
            4,
            b,
            lang,
            r#"#include <stdio.h>
#include <stdlib.h>

struct Node { int data; struct Node *next; };

struct Node* insertAtEnd(struct Node* head, int data) {
    struct Node *newNode = malloc(sizeof(struct Node));
    newNode->data = data; newNode->next = NULL;
    if (head == NULL) return newNode;
    struct Node *temp = head;
    while (temp->next != NULL) temp = temp->next;
    temp->next = newNode;
    return head;
}

void printList(struct Node *head) {
    while (head != NULL) {
        printf("%d -> ", head->data);
        head = head->next;
    }
    printf("NULL\n");
}

struct Node* reverseList(struct Node *head) {
    struct Node *prev = NULL;
    struct Node *current = head;
    struct Node *next = NULL;

    while (current != NULL) {
        next = current->next;
        current->next = prev;

        prev = current;
        current = next;
    }
    return prev;
}

int main() {
    struct Node *head = NULL;
    int n, val;
    scanf("%d", &n);
    for (int i = 0; i < n; i++) {
        scanf("%d", &val);
        head = insertAtEnd(head, val);
    }
    head = reverseList(head);
    printList(head);
    return 0;
}"#,
            "Reverse logic is correct but tests require exact format.",
            &[
                ("3\n10 20 30\n", "30 -> 20 -> 10 -> NULL"),
                ("5\n1 2 3 4 5\n", "5 -> 4 -> 3 -> 2 -> 1 -> NULL"),
            ],
            &[
                ("2\n10 20\n", "20 -> 10 -> NULL"),
                ("1\n42\n", "42 -> NULL"),
                ("0\n", "NULL"),
            ],
        ),
    ]
}

/// Built-in cohort → ordered puzzle list mapping
pub fn builtin_puzzle_sets() -> BTreeMap<Cohort, Vec<Puzzle>> {
    let mut sets = BTreeMap::new();
    sets.insert(Cohort::CohortA, python_set());
    sets.insert(Cohort::CohortB, c_set());
    sets
}

/// Get the built-in sets, built once per process
pub fn get_builtin_sets() -> &'static BTreeMap<Cohort, Vec<Puzzle>> {
    static PRESETS: OnceLock<BTreeMap<Cohort, Vec<Puzzle>>> = OnceLock::new();
    PRESETS.get_or_init(builtin_puzzle_sets)
}
